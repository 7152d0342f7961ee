//! One OS thread per simulated process.
//!
//! A run-step is a rendezvous: the worker raises its reaction on the bridge
//! (and deposits its exit in the registry) before it acknowledges the step.
//! By the time `run_step` returns, the engine can see every flag the step
//! caused, so the current iteration handles them.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use slotmap::SlotMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::{
    WorkerPool,
    body::{WorkerAction, WorkerBody, stream_rng},
};
use crate::{
    core::{Bridge, Signal, WorkerId},
    error::SimError,
};

struct WorkerHandle {
    run_tx: SyncSender<()>,
    ack_rx: Receiver<()>,
    thread: JoinHandle<()>,
}

pub struct ThreadPool {
    workers: SlotMap<WorkerId, WorkerHandle>,
    // Bodies handed in up front, by process index. Missing ones are drawn at random
    bodies: Vec<Option<WorkerBody>>,
    exits_tx: UnboundedSender<WorkerId>,
    exits_rx: UnboundedReceiver<WorkerId>,
    bridge: Arc<Bridge>,
    seed: Option<u64>,
}

impl ThreadPool {
    pub fn new(bridge: Arc<Bridge>, seed: Option<u64>) -> Self {
        let (exits_tx, exits_rx) = mpsc::unbounded_channel();
        Self {
            workers: SlotMap::with_key(),
            bodies: Vec::new(),
            exits_tx,
            exits_rx,
            bridge,
            seed,
        }
    }

    /// Threads running the given bodies instead of random ones.
    pub fn with_bodies(bodies: Vec<WorkerBody>, bridge: Arc<Bridge>) -> Self {
        let mut pool = Self::new(bridge, None);
        pool.bodies = bodies.into_iter().map(Some).collect();
        pool
    }

    pub fn live(&self) -> usize {
        self.workers.len()
    }
}

impl WorkerPool for ThreadPool {
    fn spawn(&mut self, index: usize) -> Result<WorkerId, SimError> {
        let body = match self.bodies.get_mut(index).and_then(Option::take) {
            Some(body) => body,
            // Stream 0 belongs to the engine
            None => WorkerBody::random(stream_rng(self.seed, index as u64 + 1)),
        };
        let bridge = Arc::clone(&self.bridge);
        let exits = self.exits_tx.clone();

        let worker = self.workers.try_insert_with_key(|worker| {
            let (run_tx, run_rx) = sync_channel(0);
            let (ack_tx, ack_rx) = sync_channel(1);
            let thread = thread::Builder::new()
                .name(format!("rr-worker-{index}"))
                .spawn(move || worker_main(worker, body, run_rx, ack_tx, exits, bridge))
                .map_err(|source| SimError::WorkerSpawn { index, source })?;
            Ok::<_, SimError>(WorkerHandle {
                run_tx,
                ack_rx,
                thread,
            })
        })?;

        debug!(index, ?worker, "spawned worker");
        Ok(worker)
    }

    fn run_step(&mut self, worker: WorkerId) {
        let Some(handle) = self.workers.get(worker) else {
            warn!(?worker, "run-step to reaped worker ignored");
            return;
        };

        if handle.run_tx.send(()).is_err() {
            debug!(?worker, "run-step to exited worker ignored");
            return;
        }
        // A hang-up also counts: the worker only drops its ack side after
        // reporting its exit
        let _ = handle.ack_rx.recv();
    }

    fn try_reap(&mut self) -> Option<WorkerId> {
        let worker = self.exits_rx.try_recv().ok()?;
        if let Some(handle) = self.workers.remove(worker) {
            drop(handle.run_tx);
            // The worker deposits its exit as its last act
            if handle.thread.join().is_err() {
                warn!(?worker, "worker thread panicked");
            }
        }
        Some(worker)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Closing the run channels lets any still-blocked worker fall out of its loop
        for (_, handle) in self.workers.drain() {
            drop(handle.run_tx);
        }
    }
}

fn worker_main(
    worker: WorkerId,
    mut body: WorkerBody,
    run_rx: Receiver<()>,
    ack_tx: SyncSender<()>,
    exits: UnboundedSender<WorkerId>,
    bridge: Arc<Bridge>,
) {
    while run_rx.recv().is_ok() {
        match body.on_run_step() {
            WorkerAction::Continue => {}
            WorkerAction::RequestIo => bridge.raise(Signal::IoRequest),
            WorkerAction::Exit => break,
        }
        if ack_tx.send(()).is_err() {
            return;
        }
    }

    let _ = exits.send(worker);
    bridge.raise(Signal::ChildExit);
    let _ = ack_tx.send(());
}
