pub mod bridge;
pub mod driver;
pub mod event;
pub mod observer;
pub mod queue;
pub mod state;

pub use bridge::{Bridge, Signal, spawn_ticker};
pub use driver::{IO_MAX, IO_MIN, SchedCore};
pub use event::SchedCoreEvent;
pub use queue::ReadyQueue;
pub use state::{Counters, ProcId, ProcState, ProcTable, ProcessRecord, Ticks, WorkerId};
