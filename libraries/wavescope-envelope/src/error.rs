//! Error types for envelope extraction
//!
//! Extraction failure is deliberately opaque: every file-access and decode
//! cause collapses into `ExtractionFailed`. The public API goes one step
//! further and returns `None`, logging the underlying cause.

use thiserror::Error;
use wavescope_audio::AudioError;

/// Result type for envelope extraction
pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// Errors that can occur during envelope extraction
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Extraction failed; the message is diagnostic only
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

impl From<AudioError> for EnvelopeError {
    fn from(err: AudioError) -> Self {
        Self::ExtractionFailed(err.to_string())
    }
}

impl From<std::io::Error> for EnvelopeError {
    fn from(err: std::io::Error) -> Self {
        Self::ExtractionFailed(err.to_string())
    }
}
