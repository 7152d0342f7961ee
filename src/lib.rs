pub mod config;
pub mod core;
pub mod error;
pub mod sim;
pub mod stats;
pub mod worker;

pub use crate::core::{SchedCore, SchedCoreEvent};
pub use config::SimConfig;
pub use error::SimError;
pub use sim::{Lockstep, Sim};
pub use stats::Report;
