use rand::{Rng, rngs::StdRng};
use tracing::{debug, warn};

use super::{
    bridge::{Bridge, Signal},
    event::SchedCoreEvent,
    observer::Observer,
    queue::ReadyQueue,
    state::{Counters, ProcId, ProcState, ProcTable, Ticks},
};
use crate::{error::SimError, stats::Report, worker::WorkerPool};

pub const IO_MIN: Ticks = 1;
pub const IO_MAX: Ticks = 5;

/// Round-robin engine. Owns the process table, the ready queue and the
/// workers; every mutation goes through one of the per-iteration steps.
pub struct SchedCore<P: WorkerPool> {
    pub table: ProcTable,
    pub queue: ReadyQueue,
    pub counters: Counters,
    pool: P,
    quantum: Ticks,
    running: Option<ProcId>,
    preempt_pending: bool,
    rng: StdRng,
    events: Vec<SchedCoreEvent>,
    observer: Observer,
}

impl<P: WorkerPool> SchedCore<P> {
    /// Spawn one worker per process and queue every process in creation
    /// order. Any spawn failure aborts construction.
    pub fn new(mut pool: P, procs: usize, quantum: Ticks, rng: StdRng) -> Result<Self, SimError> {
        let mut table = ProcTable::with_capacity(procs);
        let mut queue = ReadyQueue::with_capacity(procs);

        for index in 0..procs {
            let worker = pool.spawn(index)?;
            let id = table.create_proc(worker, quantum);
            queue.push(id);
        }
        debug!(procs, quantum, "process table populated");

        Ok(Self {
            table,
            queue,
            counters: Counters::default(),
            pool,
            quantum,
            running: None,
            preempt_pending: false,
            rng,
            events: Vec::new(),
            observer: Observer::new(procs),
        })
    }

    /// Initial dispatch, before the first tick.
    pub fn start(&mut self) {
        self.dispatch();
        self.observe(false);
    }

    /// One controller wake. Checks every flag. Exits are reaped before
    /// anything else touches the running slot, and I/O handling precedes
    /// preemption so a blocking request wins over an expired quantum.
    pub fn step(&mut self, bridge: &Bridge) {
        let ticked = bridge.take(Signal::Tick);
        if ticked {
            self.tick();
        }

        let reaped = if bridge.take(Signal::ChildExit) {
            self.reap()
        } else {
            0
        };

        if bridge.take(Signal::IoRequest) {
            self.handle_io_request();
        }

        self.apply_preemption();
        self.dispatch();

        // Workers only exit while running, so an exit means the CPU was busy this wake
        if reaped == 0 && self.running.is_none() && self.queue.is_empty() {
            self.counters.idle_ticks += 1;
            self.events.push(SchedCoreEvent::Idle);
        }

        self.observe(ticked);
    }

    pub fn tick(&mut self) {
        self.counters.total_ticks += 1;

        for id in 0..self.table.len() {
            if self.table.get_state(id) == ProcState::Sleeping && self.table.decrement_io(id) == 0
            {
                self.transition(id, ProcState::Ready);
                self.queue.push(id);
            }
        }

        for proc in self.table.iter_mut() {
            if proc.state == ProcState::Ready {
                proc.wait_accumulated += 1;
            }
        }

        if let Some(id) = self.running {
            self.pool.run_step(self.table.proc(id).worker);
            if self.table.decrement_quantum(id) == 0 {
                self.preempt_pending = true;
            }
        }
    }

    /// Requeue the running process if its quantum ran out during the tick.
    pub fn apply_preemption(&mut self) {
        if !std::mem::take(&mut self.preempt_pending) {
            return;
        }

        let Some(id) = self.running else {
            return;
        };
        let proc = self.table.proc(id);
        if proc.state != ProcState::Running || proc.quantum_remaining != 0 {
            return;
        }

        self.transition(id, ProcState::Ready);
        self.queue.push(id);
        self.running = None;
    }

    pub fn handle_io_request(&mut self) {
        let Some(id) = self.running.take() else {
            return;
        };

        let io = self.rng.random_range(IO_MIN..=IO_MAX);
        self.table.proc_mut(id).io_remaining = io;
        self.transition(id, ProcState::Sleeping);
        self.events.push(SchedCoreEvent::IoBlocked { proc: id, io });
    }

    /// Pick the next process if the CPU is free. No-op while one is running.
    pub fn dispatch(&mut self) {
        if self.running.is_some() {
            return;
        }

        if self.table.all_quanta_exhausted() {
            let procs = self.table.reset_quanta(self.quantum);
            if procs > 0 {
                self.events.push(SchedCoreEvent::QuantumReset { procs });
            }
        }

        // At most one lap of the queue, so a queue full of spent quanta cannot spin
        for _ in 0..self.table.len() {
            let Some(id) = self.queue.pop() else {
                break;
            };

            let proc = self.table.proc(id);
            if proc.state != ProcState::Ready {
                self.events.push(SchedCoreEvent::StaleEntryDropped { proc: id });
                continue;
            }
            if proc.quantum_remaining == 0 {
                self.queue.push(id);
                continue;
            }

            self.transition(id, ProcState::Running);
            self.running = Some(id);
            self.counters.ctx_switches += 1;
            return;
        }
    }

    /// Drain every terminated worker and retire its process. Returns the
    /// number of processes retired.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(worker) = self.pool.try_reap() {
            let Some(id) = self.table.lookup_worker(worker) else {
                warn!(?worker, "reaped worker backs no process");
                continue;
            };
            if self.table.get_state(id) == ProcState::Done {
                continue;
            }

            self.transition(id, ProcState::Done);
            self.table.proc_mut(id).completed_at = Some(self.counters.total_ticks);
            self.counters.finished += 1;
            self.queue.remove(id);
            if self.running == Some(id) {
                self.running = None;
            }
            reaped += 1;
            debug!(proc = id, finished = self.counters.finished, "process done");
        }
        reaped
    }

    pub fn all_done(&self) -> bool {
        self.counters.finished == self.table.len()
    }

    pub fn running(&self) -> Option<ProcId> {
        self.running
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SchedCoreEvent> {
        self.events.drain(..)
    }

    pub fn report(&self) -> Report {
        Report::new(self.quantum, &self.counters, self.table.records())
    }

    fn transition(&mut self, id: ProcId, to: ProcState) {
        let from = self.table.set_state(id, to);
        debug_assert!(
            from.can_become(to),
            "Illegal transition {from:?} -> {to:?} for process {id}"
        );
        self.events
            .push(SchedCoreEvent::ProcStateChange { proc: id, from, to });
    }

    fn observe(&mut self, ticked: bool) {
        self.observer.observe(
            &self.table,
            &self.queue,
            self.running,
            &self.counters,
            ticked,
        );
    }
}
