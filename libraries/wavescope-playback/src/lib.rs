//! Wavescope - Playback Control
//!
//! Stateful audio playback built on an injected output graph.
//!
//! This crate provides:
//! - [`PlaybackController`]: the transport state machine
//!   (`Idle -> Loading -> Ready -> Playing <-> Paused -> Stopped`, with a
//!   terminal `Finished` on natural completion)
//! - Background preload with supersede semantics
//! - A position-tracking loop on an injected [`Ticker`]
//! - Playback-rate and noise-reduction control
//! - Explicit interruption handling
//!
//! # Architecture
//!
//! The controller is built from three injected collaborators:
//! - a [`PlaybackGraph`] (the output graph; [`wavescope_audio::AudioEngine`]
//!   in production, mocks in tests)
//! - a [`Ticker`] ([`IntervalTicker`] for a ~60 Hz thread,
//!   [`ExternalTicker`] when the host drives ticks from its own frame
//!   callback)
//! - a [`PlaybackObserver`] receiving [`PlayerEvent`]s
//!
//! Controller methods never return errors: failures revert the state
//! machine to `Idle` and reach the observer as [`PlayerEvent::Error`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use wavescope_audio::AudioEngine;
//! use wavescope_playback::{
//!     IntervalTicker, PlaybackController, PlaybackObserver, PlayerEvent,
//! };
//!
//! struct LogObserver;
//!
//! impl PlaybackObserver for LogObserver {
//!     fn on_event(&self, event: PlayerEvent) {
//!         println!("{:?}", event);
//!     }
//! }
//!
//! let mut controller = PlaybackController::new(
//!     Box::new(AudioEngine::new()),
//!     Box::new(IntervalTicker::new()),
//!     Arc::new(LogObserver),
//! );
//!
//! controller.preload(Path::new("/music/recording.m4a"));
//! // ... once the observer sees StateChanged { state: Ready }:
//! controller.play();
//! ```

mod controller;
mod error;
mod events;
mod graph;
mod ticker;
pub mod types;

// Public exports
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{PlaybackObserver, PlayerEvent};
pub use graph::PlaybackGraph;
pub use ticker::{ExternalTicker, IntervalTicker, TickFn, TickHandle, TickStep, Ticker};
pub use types::{ControllerConfig, PlaybackRate, PlayerState};

// Re-exported so observers can match EQ levels without a direct
// wavescope-audio dependency
pub use wavescope_audio::NoiseReductionLevel;
