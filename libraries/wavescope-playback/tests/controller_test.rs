//! Integration tests for the playback controller
//!
//! These tests drive the full controller against a mock output graph and a
//! host-driven ticker, so every state-machine and position-loop property is
//! checked deterministically (no sleeping on position logic).

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wavescope_playback::{
    ExternalTicker, NoiseReductionLevel, PlaybackController, PlaybackGraph, PlaybackObserver,
    PlaybackRate, PlayerEvent, PlayerState, Result, TickHandle,
};

// ===== Test Helpers =====

/// Observable state of the mock graph
#[derive(Debug)]
struct MockGraphState {
    running: bool,
    paused: bool,
    playhead: f64,
    scheduled_start_frame: Option<u64>,
    schedule_count: usize,
    rate: f64,
    noise_reduction: NoiseReductionLevel,
    reset_count: usize,
    fail_start: bool,
}

impl Default for MockGraphState {
    fn default() -> Self {
        Self {
            running: false,
            paused: false,
            playhead: 0.0,
            scheduled_start_frame: None,
            schedule_count: 0,
            rate: 1.0,
            noise_reduction: NoiseReductionLevel::Off,
            reset_count: 0,
            fail_start: false,
        }
    }
}

/// Mock output graph with a manually advanced playhead
struct MockGraph {
    state: Arc<Mutex<MockGraphState>>,
}

impl MockGraph {
    fn new() -> (Self, Arc<Mutex<MockGraphState>>) {
        let state = Arc::new(Mutex::new(MockGraphState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl PlaybackGraph for MockGraph {
    fn start(&mut self) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_start {
            return Err(wavescope_playback::PlaybackError::EngineStart(
                "mock start failure".to_string(),
            ));
        }
        s.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.running = false;
        s.paused = false;
    }

    fn reset(&mut self) {
        let mut s = self.state.lock().unwrap();
        s.running = false;
        s.paused = false;
        s.playhead = 0.0;
        s.scheduled_start_frame = None;
        s.reset_count += 1;
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn schedule_segment(&mut self, clip: Arc<wavescope_audio::AudioClip>, start_frame: u64) {
        let mut s = self.state.lock().unwrap();
        s.scheduled_start_frame = Some(start_frame);
        s.schedule_count += 1;
        s.playhead = start_frame as f64 / clip.sample_rate() as f64;
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&mut self) {
        self.state.lock().unwrap().paused = false;
    }

    fn set_rate(&mut self, multiplier: f64) {
        self.state.lock().unwrap().rate = multiplier;
    }

    fn set_noise_reduction(&mut self, level: NoiseReductionLevel) {
        self.state.lock().unwrap().noise_reduction = level;
    }

    fn playhead_seconds(&self) -> f64 {
        self.state.lock().unwrap().playhead
    }
}

/// Observer that records every event
#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<PlayerEvent>>,
}

impl PlaybackObserver for EventLog {
    fn on_event(&self, event: PlayerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl EventLog {
    fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }

    fn states(&self) -> Vec<PlayerState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::StateChanged { state } => Some(state),
                _ => None,
            })
            .collect()
    }

    fn positions(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlayerEvent::PositionChanged { seconds } => Some(seconds),
                _ => None,
            })
            .collect()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Write a mono 16-bit sine WAV and return its path
fn write_wav(dir: &Path, name: &str, sample_rate: u32, seconds: f64) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (sample_rate as f64 * seconds).round() as u32;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = 0.5 * (2.0 * PI * 440.0 * t).sin();
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

struct Harness {
    controller: PlaybackController,
    graph: Arc<Mutex<MockGraphState>>,
    ticks: TickHandle,
    log: Arc<EventLog>,
}

fn harness() -> Harness {
    let (graph, graph_state) = MockGraph::new();
    let ticker = ExternalTicker::new();
    let ticks = ticker.handle();
    let log = Arc::new(EventLog::default());

    let controller = PlaybackController::new(
        Box::new(graph),
        Box::new(ticker),
        Arc::clone(&log) as Arc<dyn PlaybackObserver>,
    );

    Harness {
        controller,
        graph: graph_state,
        ticks,
        log,
    }
}

/// Spin until the controller reaches `state` (background decode is async)
fn wait_for_state(controller: &PlaybackController, state: PlayerState) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.player_state() != state {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {:?}, currently {:?}",
            state,
            controller.player_state()
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn preload_and_wait(h: &mut Harness, path: &Path) {
    h.controller.preload(path);
    wait_for_state(&h.controller, PlayerState::Ready);
}

// ===== Loading =====

#[test]
fn preload_missing_file_goes_idle_without_decoding() {
    let mut h = harness();

    h.controller.preload(Path::new("/nonexistent/missing.audio"));

    // Fail-fast path: exactly one Idle transition, never Loading
    assert_eq!(h.controller.player_state(), PlayerState::Idle);
    assert_eq!(
        h.log.events(),
        vec![PlayerEvent::StateChanged {
            state: PlayerState::Idle
        }]
    );
}

#[test]
fn preload_valid_file_reaches_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "valid.wav", 44100, 1.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);

    assert_eq!(h.log.states(), vec![PlayerState::Loading, PlayerState::Ready]);
    assert_eq!(h.controller.duration_seconds(), Some(1.0));

    // Graph rebuilt: full clip scheduled from frame zero
    let graph = h.graph.lock().unwrap();
    assert_eq!(graph.scheduled_start_frame, Some(0));
    assert!(graph.reset_count >= 1);
}

#[test]
fn preload_undecodable_file_reports_error_and_goes_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.wav");
    std::fs::write(&path, b"not really a wav file").unwrap();

    let mut h = harness();
    h.controller.preload(&path);
    wait_for_state(&h.controller, PlayerState::Idle);

    assert_eq!(h.log.states(), vec![PlayerState::Loading, PlayerState::Idle]);
    assert!(
        h.log
            .events()
            .iter()
            .any(|e| matches!(e, PlayerEvent::Error { .. })),
        "decode failure must reach the observer"
    );
}

#[test]
fn newer_preload_supersedes_older() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_wav(dir.path(), "first.wav", 44100, 1.0);
    let second = write_wav(dir.path(), "second.wav", 44100, 2.0);

    let mut h = harness();
    h.controller.preload(&first);
    h.controller.preload(&second);
    wait_for_state(&h.controller, PlayerState::Ready);

    // Let any stale first-decode handoff arrive, then confirm the second
    // file's session won
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(h.controller.player_state(), PlayerState::Ready);
    assert_eq!(h.controller.duration_seconds(), Some(2.0));
}

// ===== Transition table =====

#[test]
fn commands_requiring_a_clip_are_noops_without_one() {
    let mut h = harness();

    h.controller.play();
    h.controller.pause();
    h.controller.resume();
    h.controller.seek(1.0);
    h.controller.fast_forward();
    h.controller.rewind();

    assert_eq!(h.controller.player_state(), PlayerState::Idle);
    assert!(h.log.events().is_empty(), "no events for invalid commands");
    assert_eq!(h.graph.lock().unwrap().schedule_count, 0);
}

#[test]
fn pause_and_resume_only_from_matching_states() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 1.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);

    // pause from Ready: no-op
    h.controller.pause();
    assert_eq!(h.controller.player_state(), PlayerState::Ready);

    h.controller.play();
    assert_eq!(h.controller.player_state(), PlayerState::Playing);

    // resume from Playing: no-op
    h.controller.resume();
    assert_eq!(h.controller.player_state(), PlayerState::Playing);

    h.controller.pause();
    assert_eq!(h.controller.player_state(), PlayerState::Paused);

    // pause again: no-op
    h.controller.pause();
    assert_eq!(h.controller.player_state(), PlayerState::Paused);

    h.controller.resume();
    assert_eq!(h.controller.player_state(), PlayerState::Playing);
}

#[test]
fn stop_is_unconditional() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 1.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();

    h.controller.stop();
    assert_eq!(h.controller.player_state(), PlayerState::Stopped);
    assert!(!h.graph.lock().unwrap().running);
    assert!(!h.ticks.tick(), "ticker must be stopped after stop()");

    // Stop again from Stopped still transitions
    h.log.clear();
    h.controller.stop();
    assert_eq!(h.log.states(), vec![PlayerState::Stopped]);
}

#[test]
fn play_is_only_valid_from_ready() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 1.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);

    h.controller.play();
    assert_eq!(h.controller.player_state(), PlayerState::Playing);

    // play from Playing: no-op, no extra events
    h.log.clear();
    h.controller.play();
    assert_eq!(h.controller.player_state(), PlayerState::Playing);
    assert!(h.log.events().is_empty());

    // play from Paused: no-op (resume is the valid command)
    h.controller.pause();
    h.log.clear();
    h.controller.play();
    assert_eq!(h.controller.player_state(), PlayerState::Paused);
    assert!(h.log.events().is_empty());
}

#[test]
fn engine_start_failure_reverts_to_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 1.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.graph.lock().unwrap().fail_start = true;
    h.log.clear();

    h.controller.play();

    assert_eq!(h.controller.player_state(), PlayerState::Idle);
    assert!(h
        .log
        .events()
        .iter()
        .any(|e| matches!(e, PlayerEvent::Error { .. })));
    assert_eq!(h.log.states(), vec![PlayerState::Idle]);
}

// ===== Position loop =====

#[test]
fn natural_completion_emits_finished_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "two_seconds.wav", 44100, 2.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();
    h.log.clear();

    // Mid-clip ticks report the playhead
    h.graph.lock().unwrap().playhead = 0.5;
    assert!(h.ticks.tick());
    h.graph.lock().unwrap().playhead = 1.0;
    assert!(h.ticks.tick());
    assert_eq!(h.log.positions(), vec![0.5, 1.0]);

    // Inside the completion tolerance: final position is the duration
    h.graph.lock().unwrap().playhead = 1.97;
    assert!(!h.ticks.tick(), "completion tick stops the tick source");

    assert_eq!(h.controller.player_state(), PlayerState::Finished);
    assert_eq!(h.log.states(), vec![PlayerState::Finished]);
    assert_eq!(h.log.positions(), vec![0.5, 1.0, 2.0]);
    assert!(!h.graph.lock().unwrap().running, "graph stopped on finish");

    // No further callbacks after the tick source stopped
    h.log.clear();
    assert!(!h.ticks.tick());
    assert!(h.log.events().is_empty());
}

#[test]
fn no_position_events_while_paused() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 2.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();

    h.graph.lock().unwrap().playhead = 0.5;
    h.controller.pause();
    h.log.clear();

    // Ticking continues while paused, but positions are suppressed
    assert!(h.ticks.tick());
    assert!(h.ticks.tick());
    assert!(h.log.positions().is_empty());

    h.controller.resume();
    assert!(h.ticks.tick());
    assert_eq!(h.log.positions(), vec![0.5]);

    // Pause/resume did not move the playhead
    assert_eq!(h.controller.position_seconds(), 0.5);
}

// ===== Seeking =====

#[test]
fn seek_reschedules_at_the_target_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 2.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();
    h.log.clear();

    h.controller.seek(1.25);

    // round(1.25 * 44100) = 55125
    assert_eq!(h.graph.lock().unwrap().scheduled_start_frame, Some(55125));
    // State does not change on seek
    assert_eq!(h.controller.player_state(), PlayerState::Playing);
    assert!(h.log.states().is_empty());

    // Subsequent position callbacks are at or past the target
    assert!(h.ticks.tick());
    let positions = h.log.positions();
    assert!(!positions.is_empty());
    assert!(positions.iter().all(|p| *p >= 1.25), "{:?}", positions);
}

#[test]
fn skip_commands_delegate_to_seek() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 30.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();

    h.graph.lock().unwrap().playhead = 10.0;
    h.controller.fast_forward();
    assert_eq!(
        h.graph.lock().unwrap().scheduled_start_frame,
        Some(15 * 44100)
    );

    h.controller.rewind();
    assert_eq!(
        h.graph.lock().unwrap().scheduled_start_frame,
        Some(10 * 44100)
    );

    // Rewind near the start floors at zero
    h.graph.lock().unwrap().playhead = 2.0;
    h.controller.rewind();
    assert_eq!(h.graph.lock().unwrap().scheduled_start_frame, Some(0));
}

// ===== Rate and EQ =====

#[test]
fn rate_changes_apply_immediately_and_are_idempotent() {
    let mut h = harness();

    // Settable in any state, even Idle
    h.controller.set_rate(PlaybackRate::Double);
    assert_eq!(h.controller.playback_rate(), PlaybackRate::Double);
    assert_eq!(h.graph.lock().unwrap().rate, 2.0);

    let schedules_before = h.graph.lock().unwrap().schedule_count;
    h.controller.set_rate(PlaybackRate::Double);
    assert_eq!(h.graph.lock().unwrap().rate, 2.0);
    assert_eq!(
        h.graph.lock().unwrap().schedule_count,
        schedules_before,
        "repeated rate set must not disturb the schedule"
    );
    assert!(h.log.events().is_empty());
}

#[test]
fn rate_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 1.0);

    let mut h = harness();
    h.controller.set_rate(PlaybackRate::OneAndHalf);
    preload_and_wait(&mut h, &path);
    h.controller.play();

    assert_eq!(h.graph.lock().unwrap().rate, 1.5);
}

#[test]
fn noise_reduction_is_settable_any_time() {
    let mut h = harness();

    h.controller.set_noise_reduction(NoiseReductionLevel::High);
    assert_eq!(h.controller.noise_reduction(), NoiseReductionLevel::High);
    assert_eq!(
        h.graph.lock().unwrap().noise_reduction,
        NoiseReductionLevel::High
    );

    h.controller.set_noise_reduction(NoiseReductionLevel::Off);
    assert_eq!(
        h.graph.lock().unwrap().noise_reduction,
        NoiseReductionLevel::Off
    );
}

// ===== Interruptions =====

#[test]
fn interruption_pauses_and_optionally_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 2.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();
    h.log.clear();

    h.controller.interruption_began();
    assert_eq!(h.controller.player_state(), PlayerState::Paused);
    assert_eq!(
        h.log.events().first(),
        Some(&PlayerEvent::InterruptionBegan)
    );

    h.controller.interruption_ended(true);
    assert_eq!(h.controller.player_state(), PlayerState::Playing);
    assert!(h
        .log
        .events()
        .contains(&PlayerEvent::InterruptionEnded { should_resume: true }));
    assert!(h.ticks.tick(), "ticker keeps running after resume");
}

#[test]
fn interruption_without_resume_stops_ticking() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "t.wav", 44100, 2.0);

    let mut h = harness();
    preload_and_wait(&mut h, &path);
    h.controller.play();

    h.controller.interruption_began();
    h.controller.interruption_ended(false);

    assert_eq!(h.controller.player_state(), PlayerState::Paused);
    assert!(!h.ticks.tick(), "ticker stopped when not resuming");
}

#[test]
fn interruption_while_idle_only_notifies() {
    let mut h = harness();

    h.controller.interruption_began();
    h.controller.interruption_ended(true);

    assert_eq!(h.controller.player_state(), PlayerState::Idle);
    assert_eq!(
        h.log.events(),
        vec![
            PlayerEvent::InterruptionBegan,
            PlayerEvent::InterruptionEnded {
                should_resume: true
            },
        ]
    );
}

// ===== End-to-end scenario =====

#[test]
fn two_second_file_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.audio");
    let valid = write_wav(dir.path(), "valid.wav", 44100, 2.0);

    let mut h = harness();

    h.controller.preload(&missing);
    assert_eq!(h.log.states(), vec![PlayerState::Idle]);
    h.log.clear();

    preload_and_wait(&mut h, &valid);
    assert_eq!(h.log.states(), vec![PlayerState::Loading, PlayerState::Ready]);
    h.log.clear();

    h.controller.play();
    h.graph.lock().unwrap().playhead = 2.0;
    h.ticks.tick();

    assert_eq!(h.log.states(), vec![PlayerState::Playing, PlayerState::Finished]);
    assert_eq!(h.log.positions().last(), Some(&2.0));
}
