//! Decoded audio clip
//!
//! An `AudioClip` is a fully decoded audio file held in memory as
//! interleaved f32 PCM. The native channel count is preserved so that
//! per-channel analysis can run on the same clip the player schedules.

use std::sync::Arc;

/// Fully decoded PCM audio
///
/// Samples are interleaved (`L R L R...` for stereo) in the [-1.0, 1.0]
/// range. Clips are cheap to share: the playback session and the output
/// graph hold the same clip behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Interleaved samples
    samples: Vec<f32>,

    /// Sample rate in Hz
    sample_rate: u32,

    /// Number of channels
    channels: u16,
}

impl AudioClip {
    /// Create a clip from interleaved samples
    ///
    /// Trailing samples that do not form a whole frame are dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole_frames = samples.len() / channels as usize;
        samples.truncate(whole_frames * channels as usize);

        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Total number of frames (one frame = one sample per channel)
    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Check if the clip contains no frames
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved samples for `frames` frames starting at `start_frame`
    ///
    /// The segment is truncated to the frames that actually exist, so the
    /// final segment of a file may be shorter than requested. Returns an
    /// empty slice when `start_frame` is at or past the end.
    pub fn segment(&self, start_frame: u64, frames: u64) -> &[f32] {
        let total = self.frame_count();
        let start = start_frame.min(total);
        let end = start_frame.saturating_add(frames).min(total);

        let ch = self.channels as usize;
        &self.samples[start as usize * ch..end as usize * ch]
    }

    /// A single channel's sample within a frame
    pub fn sample_at(&self, frame: u64, channel: u16) -> f32 {
        self.samples[frame as usize * self.channels as usize + channel as usize]
    }

    /// Wrap the clip in an `Arc` for sharing with the output graph
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
