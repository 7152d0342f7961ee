use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    core::{Bridge, ProcId, ProcState, SchedCore, SchedCoreEvent, Signal, Ticks},
    error::SimError,
    stats::Report,
    worker::{ScriptedPool, WorkerBody},
};

/// Deterministic driver: one wake per loop, no wall clock.
///
/// Worker reactions land on the bridge during the tick that caused them, so
/// an iteration sees the tick, any I/O request and any exit together. A tick
/// is raised only when nothing else is pending.
pub struct Lockstep {
    pub core: SchedCore<ScriptedPool>,
    bridge: Arc<Bridge>,
    history: Vec<SchedCoreEvent>,
}

impl Lockstep {
    pub fn new(bodies: Vec<WorkerBody>, quantum: Ticks, seed: u64) -> Result<Self, SimError> {
        let bridge = Arc::new(Bridge::new());
        let procs = bodies.len();
        let pool = ScriptedPool::new(bodies, Arc::clone(&bridge));
        Self::with_pool(pool, procs, quantum, seed, bridge)
    }

    /// Random workers, every stream derived from `seed`.
    pub fn seeded(procs: usize, quantum: Ticks, seed: u64) -> Result<Self, SimError> {
        let bridge = Arc::new(Bridge::new());
        let pool = ScriptedPool::seeded(procs, seed, Arc::clone(&bridge));
        Self::with_pool(pool, procs, quantum, seed, bridge)
    }

    fn with_pool(
        pool: ScriptedPool,
        procs: usize,
        quantum: Ticks,
        seed: u64,
        bridge: Arc<Bridge>,
    ) -> Result<Self, SimError> {
        let mut core = SchedCore::new(pool, procs, quantum, StdRng::seed_from_u64(seed))?;
        core.start();
        let history = core.drain_events().collect();
        Ok(Self {
            core,
            bridge,
            history,
        })
    }

    pub fn step(&mut self) {
        if !self.bridge.any_pending() {
            self.bridge.raise(Signal::Tick);
        }
        self.core.step(&self.bridge);
        self.history.extend(self.core.drain_events());
    }

    pub fn run(&mut self) -> Report {
        while !self.core.all_done() {
            self.step();
        }
        self.core.report()
    }

    pub fn history(&self) -> &[SchedCoreEvent] {
        &self.history
    }

    /// States `proc` went through, starting from its initial READY.
    pub fn transitions_of(&self, proc: ProcId) -> Vec<ProcState> {
        let mut states = vec![ProcState::Ready];
        states.extend(self.history.iter().filter_map(|event| match *event {
            SchedCoreEvent::ProcStateChange { proc: p, to, .. } if p == proc => Some(to),
            _ => None,
        }));
        states
    }

    /// Process ids in the order they reached DONE.
    pub fn completion_order(&self) -> Vec<ProcId> {
        self.history
            .iter()
            .filter_map(|event| match *event {
                SchedCoreEvent::ProcStateChange {
                    proc,
                    to: ProcState::Done,
                    ..
                } => Some(proc),
                _ => None,
            })
            .collect()
    }
}
