use crate::core::{ProcId, ProcState, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedCoreEvent {
    ProcStateChange {
        proc: ProcId,
        from: ProcState,
        to: ProcState,
    },
    // Emitted right after the RUNNING -> SLEEPING change
    IoBlocked {
        proc: ProcId,
        io: Ticks,
    },
    // Every non-done process had an empty quantum at dispatch
    QuantumReset {
        procs: usize,
    },
    // Queue entry whose process was no longer READY
    StaleEntryDropped {
        proc: ProcId,
    },
    // Nothing running and nothing queued after dispatch
    Idle,
}
