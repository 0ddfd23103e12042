//! Wavescope - Audio Plumbing
//!
//! Media-layer support for the Wavescope playback and analysis crates:
//! - Symphonia-backed decoding of complete files into [`AudioClip`]s
//! - A two-band noise-reduction EQ ([`NoiseReduction`])
//! - [`AudioEngine`], a node-based output graph with segment scheduling,
//!   playback-rate control, and a monotonic render clock
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐     ┌───────────┐     ┌─────────────────────────────┐
//! │ Audio File │ ──► │  Decoder  │ ──► │ AudioClip (interleaved f32) │
//! └────────────┘     └───────────┘     └─────────────────────────────┘
//!                                                    │
//!                                                    ▼
//!                               ┌────────────────────────────────────┐
//!                               │ AudioEngine                        │
//!                               │  player node ─► EQ node ─► mixer   │
//!                               │  render clock (rate-scaled)        │
//!                               └────────────────────────────────────┘
//! ```
//!
//! The engine has no device layer: position comes from the render clock,
//! and hosts that pump audio themselves pull frames via
//! [`AudioEngine::render`].

mod clip;
mod decoder;
mod engine;
mod eq;
mod error;

pub use clip::AudioClip;
pub use decoder::decode_file;
pub use engine::AudioEngine;
pub use eq::{
    NoiseReduction, NoiseReductionLevel, ATTENUATION_STEP_DB, HIGH_PASS_CUTOFF_HZ,
    LOW_PASS_CUTOFF_HZ,
};
pub use error::{AudioError, Result};
