pub mod body;
pub mod scripted;
pub mod threaded;

use crate::{core::WorkerId, error::SimError};
pub use body::{IoChoice, WorkerAction, WorkerBody};
pub use scripted::ScriptedPool;
pub use threaded::ThreadPool;

/// The controller's view of the workers backing its processes.
///
/// Workers talk back only through the notification bridge: a pool raises
/// `IoRequest` when a worker asks to block and `ChildExit` when one
/// terminates, then hands the terminated worker out through `try_reap`.
pub trait WorkerPool {
    /// Create the worker for process `index`. Failure is fatal to the simulation.
    fn spawn(&mut self, index: usize) -> Result<WorkerId, SimError>;

    /// Deliver one "run-step" to `worker`. Ignored if the worker already exited.
    fn run_step(&mut self, worker: WorkerId);

    /// Collect one terminated worker without blocking.
    fn try_reap(&mut self) -> Option<WorkerId>;
}
