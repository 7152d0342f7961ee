use rustc_hash::FxHashMap;
use slotmap::new_key_type;

// Index into the process table, in creation order
pub type ProcId = usize;
pub type Ticks = u64;

new_key_type! {
    /// Handle of the worker backing a process. Invalidated once the worker is reaped.
    pub struct WorkerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcState {
    Ready,
    Running,
    Sleeping,
    Done,
}

impl ProcState {
    /// Legal edges of the process lifecycle. Anything not listed here is a
    /// scheduler bug.
    pub fn can_become(self, to: ProcState) -> bool {
        use ProcState::*;
        matches!(
            (self, to),
            (Ready, Running)
                | (Running, Ready)
                | (Running, Sleeping)
                | (Sleeping, Ready)
                | (Ready | Running | Sleeping, Done)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub id: ProcId,
    pub worker: WorkerId,
    pub state: ProcState,
    pub quantum_remaining: Ticks,
    pub io_remaining: Ticks,
    pub wait_accumulated: Ticks,
    pub completed_at: Option<Ticks>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub total_ticks: Ticks,
    pub ctx_switches: u64,
    pub idle_ticks: u64,
    pub finished: usize,
}

/// Process control table. Pure data: callers are responsible for only
/// performing legal transitions.
#[derive(Debug, Default)]
pub struct ProcTable {
    procs: Vec<ProcessRecord>,
    by_worker: FxHashMap<WorkerId, ProcId>,
}

impl ProcTable {
    pub fn with_capacity(procs: usize) -> Self {
        Self {
            procs: Vec::with_capacity(procs),
            by_worker: FxHashMap::with_capacity_and_hasher(procs, Default::default()),
        }
    }

    pub fn create_proc(&mut self, worker: WorkerId, quantum: Ticks) -> ProcId {
        let id = self.procs.len();
        self.procs.push(ProcessRecord {
            id,
            worker,
            state: ProcState::Ready,
            quantum_remaining: quantum,
            io_remaining: 0,
            wait_accumulated: 0,
            completed_at: None,
        });

        let prev = self.by_worker.insert(worker, id);
        debug_assert!(prev.is_none(), "Worker already backs process {prev:?}");

        id
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn proc(&self, id: ProcId) -> &ProcessRecord {
        &self.procs[id]
    }

    pub fn proc_mut(&mut self, id: ProcId) -> &mut ProcessRecord {
        &mut self.procs[id]
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.procs
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.procs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessRecord> {
        self.procs.iter_mut()
    }

    pub fn get_state(&self, id: ProcId) -> ProcState {
        self.procs[id].state
    }

    // Return previous state
    pub fn set_state(&mut self, id: ProcId, state: ProcState) -> ProcState {
        std::mem::replace(&mut self.procs[id].state, state)
    }

    pub fn lookup_worker(&self, worker: WorkerId) -> Option<ProcId> {
        self.by_worker.get(&worker).copied()
    }

    /// Decrement the remaining quantum, flooring at zero. Returns what is left.
    pub fn decrement_quantum(&mut self, id: ProcId) -> Ticks {
        let proc = &mut self.procs[id];
        proc.quantum_remaining = proc.quantum_remaining.saturating_sub(1);
        proc.quantum_remaining
    }

    /// Decrement the remaining I/O delay, flooring at zero. Returns what is left.
    pub fn decrement_io(&mut self, id: ProcId) -> Ticks {
        let proc = &mut self.procs[id];
        proc.io_remaining = proc.io_remaining.saturating_sub(1);
        proc.io_remaining
    }

    // Vacuously true once every process is done
    pub fn all_quanta_exhausted(&self) -> bool {
        self.procs
            .iter()
            .filter(|p| p.state != ProcState::Done)
            .all(|p| p.quantum_remaining == 0)
    }

    // Return number of records refilled
    pub fn reset_quanta(&mut self, quantum: Ticks) -> usize {
        let mut reset = 0;
        for proc in self.procs.iter_mut().filter(|p| p.state != ProcState::Done) {
            proc.quantum_remaining = quantum;
            reset += 1;
        }
        reset
    }

    pub fn count_in(&self, state: ProcState) -> usize {
        self.procs.iter().filter(|p| p.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn table(procs: usize, quantum: Ticks) -> ProcTable {
        let mut keys: SlotMap<WorkerId, ()> = SlotMap::with_key();
        let mut table = ProcTable::with_capacity(procs);
        for _ in 0..procs {
            table.create_proc(keys.insert(()), quantum);
        }
        table
    }

    #[test]
    fn new_records_start_ready_with_full_quantum() {
        let table = table(3, 4);
        assert_eq!(table.len(), 3);
        for (i, p) in table.iter().enumerate() {
            assert_eq!(p.id, i);
            assert_eq!(p.state, ProcState::Ready);
            assert_eq!(p.quantum_remaining, 4);
            assert_eq!(p.io_remaining, 0);
            assert_eq!(p.wait_accumulated, 0);
        }
    }

    #[test]
    fn workers_map_back_to_their_process() {
        let table = table(4, 2);
        for p in table.iter() {
            assert_eq!(table.lookup_worker(p.worker), Some(p.id));
        }
    }

    #[test]
    fn decrements_floor_at_zero() {
        let mut table = table(1, 1);
        assert_eq!(table.decrement_quantum(0), 0);
        assert_eq!(table.decrement_quantum(0), 0);
        assert_eq!(table.decrement_io(0), 0);
    }

    #[test]
    fn quantum_exhaustion_ignores_done_processes() {
        let mut table = table(3, 2);
        table.proc_mut(0).quantum_remaining = 0;
        table.proc_mut(1).quantum_remaining = 0;
        assert!(!table.all_quanta_exhausted());

        table.set_state(2, ProcState::Done);
        assert!(table.all_quanta_exhausted());

        assert_eq!(table.reset_quanta(5), 2);
        assert_eq!(table.proc(0).quantum_remaining, 5);
        assert_eq!(table.proc(1).quantum_remaining, 5);
        assert_eq!(table.proc(2).quantum_remaining, 2);
    }

    #[test]
    fn only_lifecycle_edges_are_legal() {
        use ProcState::*;
        assert!(Ready.can_become(Running));
        assert!(Running.can_become(Sleeping));
        assert!(Sleeping.can_become(Ready));
        assert!(Sleeping.can_become(Done));
        assert!(!Ready.can_become(Sleeping));
        assert!(!Sleeping.can_become(Running));
        assert!(!Done.can_become(Ready));
        assert!(!Done.can_become(Done));
    }
}
