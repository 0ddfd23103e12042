//! Platform-agnostic output graph trait
//!
//! Abstracts the audio-processing graph the controller drives. The default
//! implementation is [`wavescope_audio::AudioEngine`]; tests supply mocks
//! with manually advanced clocks so position logic never sleeps on real
//! time.

use crate::error::{PlaybackError, Result};
use std::sync::Arc;
use wavescope_audio::{AudioClip, AudioEngine, NoiseReductionLevel};

/// Output graph seam used by the playback controller
///
/// Implementors provide engine lifecycle, segment scheduling, transport
/// rate/EQ control, and the render clock the position loop reads.
pub trait PlaybackGraph: Send {
    /// Start the engine (synchronous, bounded, idempotent)
    fn start(&mut self) -> Result<()>;

    /// Halt the engine without clearing the schedule
    fn stop(&mut self);

    /// Teardown: stop, clear the schedule, reset EQ and clock
    fn reset(&mut self);

    /// Whether the engine is started
    fn is_running(&self) -> bool;

    /// Whether rendering is paused
    fn is_paused(&self) -> bool;

    /// Replace the schedule with `clip[start_frame..]`
    fn schedule_segment(&mut self, clip: Arc<AudioClip>, start_frame: u64);

    /// Freeze the render clock
    fn pause(&mut self);

    /// Unfreeze the render clock
    fn resume(&mut self);

    /// Apply a playback-rate multiplier, effective immediately
    fn set_rate(&mut self, multiplier: f64);

    /// Apply a noise-reduction level, effective immediately
    fn set_noise_reduction(&mut self, level: NoiseReductionLevel);

    /// Render-clock position in seconds from the start of the clip
    fn playhead_seconds(&self) -> f64;
}

impl PlaybackGraph for AudioEngine {
    fn start(&mut self) -> Result<()> {
        AudioEngine::start(self).map_err(PlaybackError::from)
    }

    fn stop(&mut self) {
        AudioEngine::stop(self);
    }

    fn reset(&mut self) {
        AudioEngine::reset(self);
    }

    fn is_running(&self) -> bool {
        AudioEngine::is_running(self)
    }

    fn is_paused(&self) -> bool {
        AudioEngine::is_paused(self)
    }

    fn schedule_segment(&mut self, clip: Arc<AudioClip>, start_frame: u64) {
        AudioEngine::schedule_segment(self, clip, start_frame);
    }

    fn pause(&mut self) {
        AudioEngine::pause(self);
    }

    fn resume(&mut self) {
        AudioEngine::resume(self);
    }

    fn set_rate(&mut self, multiplier: f64) {
        AudioEngine::set_rate(self, multiplier);
    }

    fn set_noise_reduction(&mut self, level: NoiseReductionLevel) {
        AudioEngine::set_noise_reduction(self, level);
    }

    fn playhead_seconds(&self) -> f64 {
        AudioEngine::playhead_seconds(self)
    }
}
