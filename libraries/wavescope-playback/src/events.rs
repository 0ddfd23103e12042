//! Playback events
//!
//! Event-based communication between the controller and its subscriber.
//! Events are emitted at key points:
//! - State changes (every transition, including repeated states)
//! - Position updates (once per tick while playing, suppressed while paused)
//! - Interruption begin/end
//! - Decode and engine errors
//!
//! Events may be delivered from the controller's tick thread or from the
//! background decode thread. Observers must not call back into the
//! controller from inside `on_event`.

use crate::types::PlayerState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Player state changed
    StateChanged {
        /// The new player state
        state: PlayerState,
    },

    /// Playback position update (elapsed seconds from clip start)
    PositionChanged {
        /// Current position in seconds
        seconds: f64,
    },

    /// An external interruption began (playback is paused in response)
    InterruptionBegan,

    /// An external interruption ended
    InterruptionEnded {
        /// Whether the interruption source permits resuming playback
        should_resume: bool,
    },

    /// Decode or engine error occurred
    Error {
        /// Error message
        message: String,
    },
}

/// Subscriber interface for playback events
///
/// Registered explicitly on the controller at construction - there is no
/// global notification channel.
pub trait PlaybackObserver: Send + Sync {
    /// Receive one playback event
    fn on_event(&self, event: PlayerEvent);
}
