use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::runtime::AppEvent;

/// How often a running trip or a tracked end time is refreshed
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a periodic tick task. The task stops when the handle is
/// cancelled or dropped.
#[derive(Debug)]
pub struct TickHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Start emitting `AppEvent::Tick` on `tx` every `interval`
    pub fn spawn(interval: Duration, tx: Sender<AppEvent>) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let worker = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                }
                // Explicit stop or the handle went away
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        }
    }

    /// A handle with no task behind it
    pub fn inert() -> Self {
        Self {
            stop: None,
            worker: None,
        }
    }

    /// Stop the task and wait for it to exit
    pub fn cancel(&mut self) {
        // Dropping the sender wakes the worker immediately
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Something that can start periodic ticks
pub trait Scheduler {
    fn schedule(&self, interval: Duration) -> TickHandle;
}

/// Schedules real ticks onto an event channel
#[derive(Debug, Clone)]
pub struct ChannelScheduler {
    tx: Sender<AppEvent>,
}

impl ChannelScheduler {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ChannelScheduler {
    fn schedule(&self, interval: Duration) -> TickHandle {
        TickHandle::spawn(interval, self.tx.clone())
    }
}

/// Hands out inert handles; ticks are driven by hand
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn schedule(&self, _interval: Duration) -> TickHandle {
        TickHandle::inert()
    }
}
