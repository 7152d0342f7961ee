use super::{
    queue::ReadyQueue,
    state::{Counters, ProcId, ProcState, ProcTable, Ticks},
};

#[derive(Debug)]
pub struct Observer {
    step: u64,
    last_waits: Vec<Ticks>,
}

impl Observer {
    pub fn new(procs: usize) -> Self {
        Self {
            step: 0,
            last_waits: vec![0; procs],
        }
    }

    pub fn observe(
        &mut self,
        table: &ProcTable,
        queue: &ReadyQueue,
        running: Option<ProcId>,
        counters: &Counters,
        ticked: bool,
    ) {
        self.step += 1;

        debug_assert!(
            table.count_in(ProcState::Running) <= 1,
            "More than one process RUNNING at step {}",
            self.step
        );

        if let Some(id) = running {
            debug_assert_eq!(
                table.get_state(id),
                ProcState::Running,
                "running slot {id} must be Running"
            );
            debug_assert!(
                !queue.contains(id),
                "Running process {id} must not appear in the ready queue"
            );
        } else {
            debug_assert_eq!(
                table.count_in(ProcState::Running),
                0,
                "Process marked Running with an empty running slot"
            );
        }

        debug_assert!(queue.len() <= table.len(), "Ready queue over capacity");
        for id in queue.iter() {
            let state = table.get_state(id);
            debug_assert_ne!(
                state,
                ProcState::Running,
                "Running process {id} present in ready queue"
            );
            debug_assert_ne!(
                state,
                ProcState::Done,
                "Done process {id} still present in ready queue"
            );
        }

        debug_assert_eq!(
            counters.finished,
            table.count_in(ProcState::Done),
            "finished count disagrees with DONE records"
        );

        for proc in table.iter() {
            let last = self.last_waits[proc.id];
            debug_assert!(
                proc.wait_accumulated >= last,
                "wait time of process {} went backwards",
                proc.id
            );
            debug_assert!(
                proc.wait_accumulated <= last + u64::from(ticked),
                "wait time of process {} grew without a tick",
                proc.id
            );
            self.last_waits[proc.id] = proc.wait_accumulated;
        }
    }
}
