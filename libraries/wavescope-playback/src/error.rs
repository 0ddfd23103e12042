//! Error types for playback control
//!
//! These errors are internal: controller methods never return them to the
//! caller. Failures are recovered locally (revert to `Idle`) and surfaced
//! through the observer's error event.

use thiserror::Error;
use wavescope_audio::AudioError;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Audio file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Audio file could not be decoded
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// Output graph failed to start
    #[error("Engine start failed: {0}")]
    EngineStart(String),

    /// No decoded clip is loaded
    #[error("No session loaded")]
    NoSessionLoaded,
}

impl From<AudioError> for PlaybackError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::FileNotFound(path) => Self::FileNotFound(path),
            AudioError::EngineStart(reason) => Self::EngineStart(reason),
            other => Self::DecodeFailed(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
