//! Notification bridge between asynchronous producers (the tick timer and
//! the workers) and the single controller loop.
//!
//! Each [`Signal`] is a sticky, payload-free flag: raising it twice before
//! the controller looks is the same as raising it once. Flags stay set until
//! [`Bridge::take`] clears them, so nothing raised is lost, but there is no
//! ordering between different flags. The controller must check all of them
//! on every wake.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Tick,
    IoRequest,
    ChildExit,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Tick, Signal::IoRequest, Signal::ChildExit];

    fn slot(self) -> usize {
        match self {
            Signal::Tick => 0,
            Signal::IoRequest => 1,
            Signal::ChildExit => 2,
        }
    }
}

#[derive(Debug, Default)]
pub struct Bridge {
    flags: [AtomicBool; 3],
    wake: Notify,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `signal` and wake the controller. Safe to call from any thread.
    pub fn raise(&self, signal: Signal) {
        self.flags[signal.slot()].store(true, Ordering::Release);
        // notify_one stores a permit if the controller is not parked yet
        self.wake.notify_one();
    }

    /// Clear `signal`, returning whether it was set.
    pub fn take(&self, signal: Signal) -> bool {
        self.flags[signal.slot()].swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self, signal: Signal) -> bool {
        self.flags[signal.slot()].load(Ordering::Acquire)
    }

    pub fn any_pending(&self) -> bool {
        Signal::ALL.iter().any(|&s| self.is_pending(s))
    }

    /// Suspend until at least one flag is set. Returns immediately if one
    /// already is.
    pub async fn wait(&self) {
        loop {
            if self.any_pending() {
                return;
            }
            self.wake.notified().await;
        }
    }
}

/// Raise [`Signal::Tick`] once per `period`, forever. Abort the handle to stop.
pub fn spawn_ticker(bridge: Arc<Bridge>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // skip immediate tick

        loop {
            interval.tick().await;
            bridge.raise(Signal::Tick);
        }
    })
}
