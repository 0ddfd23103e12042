//! Wavescope - Loudness Envelope Extraction
//!
//! Converts an audio file into an ordered sequence of non-negative
//! loudness samples for waveform rendering.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐     ┌───────────────────┐     ┌────────────────────────┐
//! │ Audio File │ ──► │ EnvelopeExtractor │ ──► │ Vec<f32> (one value    │
//! └────────────┘     │  fixed windows    │     │  per window, floor 0.0)│
//!                    │  RMS -> dB -> norm│     └────────────────────────┘
//!                    └───────────────────┘
//! ```
//!
//! Three strategies share the contract:
//! - [`EnvelopeExtractor::extract_per_channel`] - full decode, per-channel
//!   values (carries a documented formula inconsistency kept for
//!   compatibility with existing waveform data)
//! - [`EnvelopeExtractor::extract_averaged`] - full decode, one value per
//!   window
//! - [`EnvelopeExtractor::extract_downmixed`] - container-level streaming
//!   over mono 16-bit PCM
//!
//! Extraction is synchronous, stateless across calls, and independent of
//! the playback controller; both may operate on the same file at different
//! times.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wavescope_envelope::EnvelopeExtractor;
//!
//! let extractor = EnvelopeExtractor::new();
//! if let Some(levels) = extractor.extract_averaged(Path::new("take.m4a")) {
//!     // levels.len() == ceil(duration / 0.1s), each in display units
//!     render_waveform(&levels);
//! }
//! # fn render_waveform(_levels: &[f32]) {}
//! ```

mod error;
mod extractor;

pub use error::{EnvelopeError, Result};
pub use extractor::{EnvelopeConfig, EnvelopeExtractor, DISPLAY_SCALE, LOUDNESS_FLOOR_DB};
