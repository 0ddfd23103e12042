//! Periodic tick source
//!
//! A generic timer abstraction driving the controller's position loop,
//! in place of a display-refresh callback. Guarantees shared by all
//! implementations:
//! - ticks fire in monotonically increasing time order
//! - no tick fires after `stop()` returns
//! - `start` and `stop` are idempotent
//!
//! [`IntervalTicker`] runs a dedicated thread at a fixed period.
//! [`ExternalTicker`] lets the embedding application drive ticks from its
//! own frame callback (and gives tests a deterministic driver).

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Whether the tick source should keep firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    /// Keep ticking
    Continue,

    /// Stop the tick source; no further ticks fire
    Stop,
}

/// Tick callback invoked once per period
pub type TickFn = Box<dyn FnMut() -> TickStep + Send>;

/// Periodic tick source
pub trait Ticker: Send {
    /// Start firing `on_tick` every `period`
    ///
    /// No-op if already active.
    fn start(&mut self, period: Duration, on_tick: TickFn);

    /// Stop firing
    ///
    /// No tick is in flight once this returns. Callers must not hold locks
    /// that the tick callback also takes. No-op if not active.
    fn stop(&mut self);

    /// Whether ticks are currently firing
    fn is_active(&self) -> bool;
}

/// Worker state for an active interval ticker
struct TickerWorker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Thread-backed ticker firing at a fixed period
///
/// The worker thread waits on a stop channel with a timeout equal to the
/// period, so `stop()` takes effect within one period and the callback is
/// never invoked concurrently with itself.
#[derive(Default)]
pub struct IntervalTicker {
    worker: Option<TickerWorker>,
}

impl IntervalTicker {
    /// Create an inactive ticker
    pub fn new() -> Self {
        Self { worker: None }
    }

    fn reap_finished(&mut self) {
        if self
            .worker
            .as_ref()
            .is_some_and(|w| w.handle.is_finished())
        {
            if let Some(worker) = self.worker.take() {
                worker.handle.join().ok();
            }
        }
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, period: Duration, mut on_tick: TickFn) {
        // A callback that returned Stop leaves a finished thread behind;
        // reap it so the ticker can restart
        self.reap_finished();
        if self.worker.is_some() {
            return;
        }

        let (stop_tx, stop_rx): (Sender<()>, Receiver<()>) = bounded(1);

        let handle = thread::Builder::new()
            .name("position-ticker".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if on_tick() == TickStep::Stop {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("Failed to spawn position ticker thread");

        self.worker = Some(TickerWorker { stop_tx, handle });
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop_tx.send(()).ok();
            worker.handle.join().ok();
        }
    }

    fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared slot holding the active callback of an [`ExternalTicker`]
type SharedTickFn = Arc<Mutex<Option<TickFn>>>;

/// Host-driven tick source
///
/// The embedding application obtains a [`TickHandle`] and calls
/// [`TickHandle::tick`] from its own periodic callback (a display-refresh
/// callback, a game loop, a test). The ticker itself never spawns threads.
#[derive(Default)]
pub struct ExternalTicker {
    shared: SharedTickFn,
}

impl ExternalTicker {
    /// Create an inactive ticker
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for the host to drive ticks through
    pub fn handle(&self) -> TickHandle {
        TickHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Ticker for ExternalTicker {
    fn start(&mut self, _period: Duration, on_tick: TickFn) {
        let mut slot = self.shared.lock().unwrap();
        if slot.is_none() {
            *slot = Some(on_tick);
        }
    }

    fn stop(&mut self) {
        self.shared.lock().unwrap().take();
    }

    fn is_active(&self) -> bool {
        self.shared.lock().unwrap().is_some()
    }
}

/// Driver handle for an [`ExternalTicker`]
#[derive(Clone)]
pub struct TickHandle {
    shared: SharedTickFn,
}

impl TickHandle {
    /// Fire one tick
    ///
    /// Returns true if the ticker is still active afterwards. Does nothing
    /// when the ticker is stopped.
    pub fn tick(&self) -> bool {
        let mut slot = self.shared.lock().unwrap();
        let Some(on_tick) = slot.as_mut() else {
            return false;
        };

        if on_tick() == TickStep::Stop {
            *slot = None;
            return false;
        }
        true
    }
}
