//! In-process workers stepped synchronously by the controller.
//!
//! Reactions to a run-step are raised on the bridge before `run_step`
//! returns, so the engine sees them in the same iteration as the tick that
//! caused them.

use std::collections::VecDeque;
use std::sync::Arc;

use slotmap::SlotMap;

use super::{
    WorkerPool,
    body::{WorkerAction, WorkerBody, stream_rng},
};
use crate::{
    core::{Bridge, Signal, WorkerId},
    error::SimError,
};

pub struct ScriptedPool {
    // Bodies not yet spawned, by process index
    unspawned: Vec<Option<WorkerBody>>,
    workers: SlotMap<WorkerId, WorkerBody>,
    exited: VecDeque<WorkerId>,
    bridge: Arc<Bridge>,
    run_steps: u64,
}

impl ScriptedPool {
    pub fn new(bodies: Vec<WorkerBody>, bridge: Arc<Bridge>) -> Self {
        Self {
            unspawned: bodies.into_iter().map(Some).collect(),
            workers: SlotMap::with_key(),
            exited: VecDeque::new(),
            bridge,
            run_steps: 0,
        }
    }

    /// `procs` random workers whose streams all derive from `seed`.
    pub fn seeded(procs: usize, seed: u64, bridge: Arc<Bridge>) -> Self {
        let bodies = (0..procs)
            .map(|index| WorkerBody::random(stream_rng(Some(seed), index as u64 + 1)))
            .collect();
        Self::new(bodies, bridge)
    }

    pub fn live(&self) -> usize {
        self.workers.len()
    }

    // Deliveries to exited workers included
    pub fn run_steps(&self) -> u64 {
        self.run_steps
    }
}

impl WorkerPool for ScriptedPool {
    fn spawn(&mut self, index: usize) -> Result<WorkerId, SimError> {
        let body = self
            .unspawned
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| SimError::WorkerSpawn {
                index,
                source: std::io::Error::other("no worker body scripted for this process"),
            })?;
        Ok(self.workers.insert(body))
    }

    fn run_step(&mut self, worker: WorkerId) {
        self.run_steps += 1;
        let Some(body) = self.workers.get_mut(worker) else {
            return;
        };

        match body.on_run_step() {
            WorkerAction::Continue => {}
            WorkerAction::RequestIo => self.bridge.raise(Signal::IoRequest),
            WorkerAction::Exit => {
                self.workers.remove(worker);
                self.exited.push_back(worker);
                self.bridge.raise(Signal::ChildExit);
            }
        }
    }

    fn try_reap(&mut self) -> Option<WorkerId> {
        self.exited.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_fails_without_a_body() {
        let bridge = Arc::new(Bridge::new());
        let mut pool = ScriptedPool::new(vec![WorkerBody::scripted(1, false)], bridge);
        assert!(pool.spawn(0).is_ok());
        assert!(matches!(
            pool.spawn(0),
            Err(SimError::WorkerSpawn { index: 0, .. })
        ));
        assert!(matches!(
            pool.spawn(1),
            Err(SimError::WorkerSpawn { index: 1, .. })
        ));
    }

    #[test]
    fn reactions_are_raised_synchronously() {
        let bridge = Arc::new(Bridge::new());
        let mut pool = ScriptedPool::new(
            vec![WorkerBody::scripted(1, true)],
            Arc::clone(&bridge),
        );
        let worker = pool.spawn(0).unwrap();

        pool.run_step(worker);
        assert!(bridge.take(Signal::IoRequest));
        assert!(pool.try_reap().is_none());

        pool.run_step(worker);
        assert!(bridge.take(Signal::ChildExit));
        assert_eq!(pool.try_reap(), Some(worker));
        assert_eq!(pool.live(), 0);

        // Stale handle: counted, otherwise ignored
        pool.run_step(worker);
        assert_eq!(pool.run_steps(), 3);
        assert!(!bridge.any_pending());
    }
}
