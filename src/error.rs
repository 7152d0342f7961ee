//! Simulator error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to spawn worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("interrupted before all processes finished")]
    Interrupted,
}
