//! Playback controller - core orchestration
//!
//! Owns the lifecycle of one audio file's playback: translates transport
//! commands into graph operations, tracks the player state machine, and
//! reports state and position changes to the registered observer.
//!
//! # Concurrency
//!
//! Controller state lives behind a single mutex - the controller's "home"
//! execution context. Transport methods, the background decode completion,
//! and tick callbacks each take the lock, so all mutation is serialized.
//! The decode thread only decodes; it hands control back by applying its
//! result under the lock, guarded by a generation counter so a newer
//! `preload` supersedes it (the result is discarded, not aborted).
//!
//! The ticker is started and stopped only while the state lock is NOT
//! held, so a tick in flight can always finish.

use crate::error::PlaybackError;
use crate::events::{PlaybackObserver, PlayerEvent};
use crate::graph::PlaybackGraph;
use crate::ticker::{TickStep, Ticker};
use crate::types::{ControllerConfig, PlaybackRate, PlayerState};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use wavescope_audio::{AudioClip, NoiseReductionLevel};

/// One loaded file's playback session
///
/// Exactly one session is live at a time; a new `preload` tears down the
/// graph and replaces the session.
struct PlaybackSession {
    /// Decoded clip, shared with the graph schedule
    clip: Arc<AudioClip>,

    /// Suppresses position events while paused (ticking continues)
    is_paused: bool,
}

/// State shared between the controller, the decode thread, and tick callbacks
struct ControllerState {
    player_state: PlayerState,
    session: Option<PlaybackSession>,
    graph: Box<dyn PlaybackGraph>,
    rate: PlaybackRate,
    noise_reduction: NoiseReductionLevel,

    /// Preload generation; a decode result with a stale generation is
    /// discarded at the handoff point
    generation: u64,

    observer: Arc<dyn PlaybackObserver>,
    completion_tolerance: f64,
}

impl ControllerState {
    fn emit(&self, event: PlayerEvent) {
        self.observer.on_event(event);
    }

    /// Set the player state and notify the observer
    ///
    /// Emits on every call, including transitions into the current state.
    fn transition(&mut self, next: PlayerState) {
        tracing::debug!(from = ?self.player_state, to = ?next, "player state transition");
        self.player_state = next;
        self.emit(PlayerEvent::StateChanged { state: next });
    }

    /// One pass of the position-tracking loop
    fn on_tick(&mut self) -> TickStep {
        if !matches!(self.player_state, PlayerState::Playing | PlayerState::Paused) {
            // Defensive: a stale tick after stop/preload ends the loop
            return TickStep::Stop;
        }

        let Some(session) = &self.session else {
            return TickStep::Stop;
        };

        let duration = session.clip.duration_seconds();
        let elapsed = self.graph.playhead_seconds();

        if elapsed >= duration - self.completion_tolerance {
            // The tolerance absorbs clock jitter near end-of-file, so
            // completion is reported at most once
            self.emit(PlayerEvent::PositionChanged { seconds: duration });
            self.transition(PlayerState::Finished);
            self.graph.stop();
            return TickStep::Stop;
        }

        if !session.is_paused {
            self.emit(PlayerEvent::PositionChanged { seconds: elapsed });
        }
        TickStep::Continue
    }
}

/// Stateful audio playback controller
///
/// Commands that require a decoded file (`play`, `seek`, `pause`, `resume`)
/// are only valid from `Ready`/`Playing`/`Paused`; invalid transitions are
/// logged no-ops. No method returns an error: failures revert the
/// controller to `Idle` and surface through [`PlayerEvent::Error`].
pub struct PlaybackController {
    shared: Arc<Mutex<ControllerState>>,
    ticker: Box<dyn Ticker>,
    config: ControllerConfig,

    /// In-flight preload; replaced (not joined) when superseded
    decode_task: Option<JoinHandle<()>>,
}

impl PlaybackController {
    /// Create a controller with the default configuration
    pub fn new(
        graph: Box<dyn PlaybackGraph>,
        ticker: Box<dyn Ticker>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Self {
        Self::with_config(graph, ticker, observer, ControllerConfig::default())
    }

    /// Create a controller with an explicit configuration
    pub fn with_config(
        graph: Box<dyn PlaybackGraph>,
        ticker: Box<dyn Ticker>,
        observer: Arc<dyn PlaybackObserver>,
        config: ControllerConfig,
    ) -> Self {
        let shared = ControllerState {
            player_state: PlayerState::Idle,
            session: None,
            graph,
            rate: PlaybackRate::default(),
            noise_reduction: NoiseReductionLevel::Off,
            generation: 0,
            observer,
            completion_tolerance: config.completion_tolerance,
        };

        Self {
            shared: Arc::new(Mutex::new(shared)),
            ticker,
            config,
            decode_task: None,
        }
    }

    // ===== Loading =====

    /// Load an audio file for playback
    ///
    /// Validates existence synchronously (missing file: fail fast to
    /// `Idle`), then resets the graph, transitions to `Loading`, and
    /// decodes on a background thread. On success the graph is rebuilt
    /// with the full clip scheduled and the state becomes `Ready`; on
    /// decode failure the state reverts to `Idle` and the error reaches
    /// the observer.
    ///
    /// A preload issued while another is in flight supersedes it: the
    /// earlier result is discarded when it arrives.
    pub fn preload(&mut self, path: &Path) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;

            if !path.exists() {
                tracing::warn!(path = %path.display(), "preload: file not found");
                state.transition(PlayerState::Idle);
                return;
            }

            state.graph.reset();
            state.session = None;
            state.transition(PlayerState::Loading);
            state.generation
        };

        self.ticker.stop();

        // Supersede, not abort: the previous task keeps decoding but its
        // result will fail the generation check
        let _superseded = self.decode_task.take();

        let shared = Arc::clone(&self.shared);
        let path = path.to_path_buf();

        let handle = thread::Builder::new()
            .name("clip-decoder".to_string())
            .spawn(move || {
                let result = wavescope_audio::decode_file(&path);

                let mut state = shared.lock().unwrap();
                if state.generation != generation {
                    tracing::debug!(path = %path.display(), "preload superseded, discarding decode");
                    return;
                }

                match result {
                    Ok(clip) => {
                        let clip = clip.into_shared();
                        state.graph.schedule_segment(Arc::clone(&clip), 0);
                        let rate_multiplier = state.rate.multiplier();
                        let noise_reduction = state.noise_reduction;
                        state.graph.set_rate(rate_multiplier);
                        state.graph.set_noise_reduction(noise_reduction);
                        state.session = Some(PlaybackSession {
                            clip,
                            is_paused: false,
                        });
                        state.transition(PlayerState::Ready);
                    }
                    Err(e) => {
                        let err = PlaybackError::from(e);
                        tracing::warn!(path = %path.display(), error = %err, "preload: decode failed");
                        state.emit(PlayerEvent::Error {
                            message: err.to_string(),
                        });
                        state.transition(PlayerState::Idle);
                    }
                }
            })
            .expect("Failed to spawn clip decoder thread");

        self.decode_task = Some(handle);
    }

    // ===== Transport =====

    /// Start playback of the loaded clip
    ///
    /// Valid only from `Ready`. Starts the graph, schedules the full clip,
    /// applies the configured rate, and begins position ticking. An engine
    /// start failure reverts to `Idle` with an error event.
    pub fn play(&mut self) {
        let should_tick = {
            let mut state = self.lock();

            let clip = match (&state.player_state, &state.session) {
                (PlayerState::Ready, Some(session)) => Arc::clone(&session.clip),
                _ => {
                    tracing::debug!(state = ?state.player_state, "play ignored");
                    return;
                }
            };

            if let Err(e) = state.graph.start() {
                tracing::warn!(error = %e, "play: engine start failed");
                state.emit(PlayerEvent::Error {
                    message: e.to_string(),
                });
                state.graph.reset();
                state.session = None;
                state.transition(PlayerState::Idle);
                false
            } else {
                state.graph.schedule_segment(clip, 0);
                let rate = state.rate.multiplier();
                state.graph.set_rate(rate);
                state.transition(PlayerState::Playing);
                true
            }
        };

        if should_tick {
            self.start_ticker();
        }
    }

    /// Pause playback
    ///
    /// Valid only from `Playing` with the graph actually running. Position
    /// events are suppressed while paused; ticking continues.
    pub fn pause(&mut self) {
        let mut state = self.lock();

        if state.player_state != PlayerState::Playing {
            tracing::debug!(state = ?state.player_state, "pause ignored");
            return;
        }
        if !state.graph.is_running() || state.graph.is_paused() {
            tracing::debug!("pause ignored: graph not in running state");
            return;
        }

        state.graph.pause();
        if let Some(session) = &mut state.session {
            session.is_paused = true;
        }
        state.transition(PlayerState::Paused);
    }

    /// Resume paused playback
    pub fn resume(&mut self) {
        let mut state = self.lock();

        if state.player_state != PlayerState::Paused {
            tracing::debug!(state = ?state.player_state, "resume ignored");
            return;
        }
        if !state.graph.is_running() || !state.graph.is_paused() {
            tracing::debug!("resume ignored: graph not in paused state");
            return;
        }

        state.graph.resume();
        if let Some(session) = &mut state.session {
            session.is_paused = false;
        }
        state.transition(PlayerState::Playing);
    }

    /// Halt playback unconditionally
    ///
    /// Resets the graph, stops ticking, and transitions to `Stopped`.
    pub fn stop(&mut self) {
        {
            let mut state = self.lock();
            state.graph.stop();
            state.graph.reset();
            state.session = None;
            state.transition(PlayerState::Stopped);
        }
        self.ticker.stop();
    }

    /// Seek to an absolute position in seconds
    ///
    /// The target is not clamped; callers pass valid times. Reschedules
    /// the remaining segment from `round(seconds * sample_rate)` to the
    /// end of the clip. The player state does not change.
    pub fn seek(&mut self, seconds: f64) {
        let mut state = self.lock();

        if !state.player_state.has_loaded_clip() {
            tracing::debug!(state = ?state.player_state, "seek ignored");
            return;
        }
        let Some(session) = &state.session else {
            return;
        };

        let clip = Arc::clone(&session.clip);
        let frame = (seconds * clip.sample_rate() as f64).round() as u64;
        state.graph.schedule_segment(clip, frame);
    }

    /// Skip forward by the configured skip interval
    pub fn fast_forward(&mut self) {
        let Some(elapsed) = self.elapsed_with_session() else {
            tracing::debug!("fast_forward ignored: no session");
            return;
        };
        self.seek(elapsed + self.config.skip_seconds);
    }

    /// Skip backward by the configured skip interval
    ///
    /// The target is floored at the start of the clip.
    pub fn rewind(&mut self) {
        let Some(elapsed) = self.elapsed_with_session() else {
            tracing::debug!("rewind ignored: no session");
            return;
        };
        self.seek((elapsed - self.config.skip_seconds).max(0.0));
    }

    // ===== Rate and EQ =====

    /// Set the playback rate, applied immediately to the output node
    ///
    /// Valid in any state; the value persists across sessions.
    pub fn set_rate(&mut self, rate: PlaybackRate) {
        let mut state = self.lock();
        state.rate = rate;
        state.graph.set_rate(rate.multiplier());
    }

    /// Set the noise-reduction level, applied immediately to the EQ node
    ///
    /// Valid in any state; the value persists across sessions.
    pub fn set_noise_reduction(&mut self, level: NoiseReductionLevel) {
        let mut state = self.lock();
        state.noise_reduction = level;
        state.graph.set_noise_reduction(level);
    }

    // ===== Interruptions =====

    /// Handle the beginning of an external interruption
    ///
    /// Notifies the observer, then pauses if playing.
    pub fn interruption_began(&mut self) {
        {
            let state = self.lock();
            state.emit(PlayerEvent::InterruptionBegan);
        }
        self.pause();
    }

    /// Handle the end of an external interruption
    ///
    /// Notifies the observer with the resumption flag; resumes if
    /// permitted. If the player is not playing afterwards, the tick
    /// source is stopped as cleanup.
    pub fn interruption_ended(&mut self, should_resume: bool) {
        {
            let state = self.lock();
            state.emit(PlayerEvent::InterruptionEnded { should_resume });
        }

        if should_resume {
            self.resume();
        }

        let playing = self.lock().player_state == PlayerState::Playing;
        if !playing {
            self.ticker.stop();
        }
    }

    // ===== State queries =====

    /// Current player state
    pub fn player_state(&self) -> PlayerState {
        self.lock().player_state
    }

    /// Current playback rate
    pub fn playback_rate(&self) -> PlaybackRate {
        self.lock().rate
    }

    /// Current noise-reduction level
    pub fn noise_reduction(&self) -> NoiseReductionLevel {
        self.lock().noise_reduction
    }

    /// Render-clock position in seconds (0.0 with no session)
    pub fn position_seconds(&self) -> f64 {
        self.lock().graph.playhead_seconds()
    }

    /// Duration of the loaded clip, if one is loaded
    pub fn duration_seconds(&self) -> Option<f64> {
        self.lock()
            .session
            .as_ref()
            .map(|s| s.clip.duration_seconds())
    }

    // ===== Internals =====

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.shared.lock().unwrap()
    }

    /// Render-clock position, or None without a live session
    fn elapsed_with_session(&self) -> Option<f64> {
        let state = self.lock();
        state
            .session
            .as_ref()
            .map(|_| state.graph.playhead_seconds())
    }

    fn start_ticker(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.ticker.start(
            self.config.tick_period,
            Box::new(move || shared.lock().unwrap().on_tick()),
        );
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.ticker.stop();
    }
}
