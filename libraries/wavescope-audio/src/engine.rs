//! Audio output engine
//!
//! A small node-based output graph: player node (the scheduled segment) →
//! noise-reduction EQ → mixer. There is no device layer here; the engine
//! tracks position with a rate-scaled render clock and exposes a pull-based
//! `render` path for hosts that pump audio themselves.

use crate::clip::AudioClip;
use crate::eq::{NoiseReduction, NoiseReductionLevel};
use crate::error::Result;
use std::sync::Arc;
use std::time::Instant;

/// Rate-scaled, pause-aware monotonic clock
///
/// Elapsed time accrues at the active rate multiplier while the clock is
/// running. Changing the rate folds the time accrued so far at the old rate
/// before switching, so mid-play rate changes never rewrite history.
#[derive(Debug)]
struct RenderClock {
    /// Seconds accrued during previous run spans (already rate-scaled)
    accrued: f64,

    /// Start of the current run span, None while frozen
    started: Option<Instant>,

    /// Active rate multiplier
    rate: f64,
}

impl RenderClock {
    fn new() -> Self {
        Self {
            accrued: 0.0,
            started: None,
            rate: 1.0,
        }
    }

    fn run(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn freeze(&mut self) {
        if let Some(started) = self.started.take() {
            self.accrued += started.elapsed().as_secs_f64() * self.rate;
        }
    }

    fn set_rate(&mut self, rate: f64) {
        let was_running = self.started.is_some();
        self.freeze();
        self.rate = rate;
        if was_running {
            self.run();
        }
    }

    fn elapsed(&self) -> f64 {
        let current = self
            .started
            .map_or(0.0, |started| started.elapsed().as_secs_f64() * self.rate);
        self.accrued + current
    }
}

/// The player node's schedule: a clip segment from a start frame to the end
#[derive(Debug)]
struct ScheduledSegment {
    clip: Arc<AudioClip>,

    /// First frame of the segment within the clip
    start_frame: u64,

    /// Frames already rendered from the segment
    cursor: u64,
}

impl ScheduledSegment {
    fn remaining_frames(&self) -> u64 {
        self.clip
            .frame_count()
            .saturating_sub(self.start_frame)
            .saturating_sub(self.cursor)
    }
}

/// Node-based audio output graph
///
/// Owns the scheduled segment, the EQ node, and the render clock. Start and
/// stop are synchronous and idempotent. Scheduling a segment replaces any
/// previous schedule and re-origins the render clock.
#[derive(Debug)]
pub struct AudioEngine {
    running: bool,
    paused: bool,
    nr_level: NoiseReductionLevel,
    rate: f64,
    schedule: Option<ScheduledSegment>,
    eq: Option<NoiseReduction>,
    clock: RenderClock,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    /// Create a stopped engine with an empty schedule
    pub fn new() -> Self {
        Self {
            running: false,
            paused: false,
            nr_level: NoiseReductionLevel::Off,
            rate: 1.0,
            schedule: None,
            eq: None,
            clock: RenderClock::new(),
        }
    }

    /// Start the engine
    ///
    /// Synchronous and bounded. Idempotent: starting a running engine is a
    /// no-op. The render clock begins accruing if a segment is scheduled.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        self.running = true;
        if self.schedule.is_some() && !self.paused {
            self.clock.run();
        }
        tracing::debug!("Audio engine started");
        Ok(())
    }

    /// Halt the engine without clearing the schedule
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused = false;
        self.clock.freeze();
        tracing::debug!("Audio engine stopped");
    }

    /// Teardown: stop, clear the schedule, reset EQ state and clock
    pub fn reset(&mut self) {
        self.stop();
        self.schedule = None;
        self.eq = None;
        self.clock = RenderClock::new();
        self.clock.set_rate(self.rate);
    }

    /// Whether the engine is started
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether rendering is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replace the schedule with `clip[start_frame..]`
    ///
    /// Re-origins the render clock at the segment start. A start frame at or
    /// past the end of the clip yields an empty segment (renders nothing).
    pub fn schedule_segment(&mut self, clip: Arc<AudioClip>, start_frame: u64) {
        let eq = NoiseReduction::with_level(clip.sample_rate(), clip.channels(), self.nr_level);

        self.schedule = Some(ScheduledSegment {
            clip,
            start_frame,
            cursor: 0,
        });
        self.eq = Some(eq);

        self.clock = RenderClock::new();
        self.clock.set_rate(self.rate);
        if self.running && !self.paused {
            self.clock.run();
        }
    }

    /// Freeze the render clock
    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
        self.clock.freeze();
    }

    /// Unfreeze the render clock
    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }
        self.paused = false;
        if self.schedule.is_some() {
            self.clock.run();
        }
    }

    /// Set the playback-rate multiplier, effective immediately
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
        self.clock.set_rate(rate);
    }

    /// Current rate multiplier
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set the noise-reduction level, effective immediately
    pub fn set_noise_reduction(&mut self, level: NoiseReductionLevel) {
        self.nr_level = level;
        if let Some(eq) = &mut self.eq {
            eq.set_level(level);
        }
    }

    /// Current noise-reduction level
    pub fn noise_reduction(&self) -> NoiseReductionLevel {
        self.nr_level
    }

    /// Render-clock position in seconds from the start of the clip
    ///
    /// Segment origin plus rate-scaled elapsed time. Zero with no schedule.
    pub fn playhead_seconds(&self) -> f64 {
        let Some(segment) = &self.schedule else {
            return 0.0;
        };
        let origin = segment.start_frame as f64 / segment.clip.sample_rate() as f64;
        origin + self.clock.elapsed()
    }

    /// Pull interleaved samples through the graph into `out`
    ///
    /// Copies frames from the scheduled segment, runs the EQ node, and
    /// advances the frame cursor. Returns the number of samples written:
    /// 0 when stopped, unscheduled, or at the end of the schedule. While
    /// paused the buffer is filled with silence and fully "written".
    pub fn render(&mut self, out: &mut [f32]) -> usize {
        if !self.running {
            out.fill(0.0);
            return 0;
        }

        if self.paused {
            out.fill(0.0);
            return out.len();
        }

        let Some(segment) = &mut self.schedule else {
            out.fill(0.0);
            return 0;
        };

        let channels = segment.clip.channels() as usize;
        let out_frames = (out.len() / channels) as u64;
        let frames = out_frames.min(segment.remaining_frames());
        if frames == 0 {
            out.fill(0.0);
            return 0;
        }

        let source = segment
            .clip
            .segment(segment.start_frame + segment.cursor, frames);
        let written = source.len();
        out[..written].copy_from_slice(source);
        segment.cursor += frames;

        if let Some(eq) = &mut self.eq {
            eq.process(&mut out[..written]);
        }

        written
    }
}
