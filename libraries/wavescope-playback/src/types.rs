//! Core types for playback control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player state
///
/// `Finished` is terminal for a session: only a new `preload` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// No file loaded
    Idle,

    /// Decoding a file in the background
    Loading,

    /// Decoded and scheduled, waiting for play
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-clip
    Paused,

    /// Explicitly stopped
    Stopped,

    /// Playback ran to the end of the clip
    Finished,
}

impl PlayerState {
    /// Whether a decoded clip is live in this state
    ///
    /// Transport commands that need a file (`play`, `seek`, `pause`,
    /// `resume`) are only valid when this is true.
    pub fn has_loaded_clip(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }
}

/// Playback rate multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackRate {
    /// 0.5x
    Half,

    /// 1.0x
    Normal,

    /// 1.5x
    OneAndHalf,

    /// 2.0x
    Double,
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::Normal
    }
}

impl PlaybackRate {
    /// Rate as a multiplier applied to the output node
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::Normal => 1.0,
            Self::OneAndHalf => 1.5,
            Self::Double => 2.0,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Seconds skipped by fast-forward / rewind (default: 5.0)
    pub skip_seconds: f64,

    /// Position tick period (default: ~60 Hz)
    pub tick_period: Duration,

    /// End-of-clip tolerance in seconds (default: 0.05)
    ///
    /// Absorbs render-clock jitter near the end of the file so completion
    /// is detected and reported at most once.
    pub completion_tolerance: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            skip_seconds: 5.0,
            tick_period: Duration::from_micros(16_667),
            completion_tolerance: 0.05,
        }
    }
}
