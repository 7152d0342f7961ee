//! Command line and environment configuration.

use std::time::Duration;

use clap::Parser;

use crate::{core::Ticks, error::SimError};

pub const DEFAULT_QUANTUM: Ticks = 2;
pub const DEFAULT_PROCS: usize = 10;
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Round-robin CPU scheduler simulator backed by real worker threads.
#[derive(Parser, Debug)]
#[command(name = "rr_model", version, about)]
pub struct Cli {
    /// Time quantum in ticks. Non-numeric, zero or negative values fall back to 2.
    #[arg(env = "RR_QUANTUM", allow_negative_numbers = true)]
    pub quantum: Option<String>,

    /// Number of simulated processes.
    #[arg(short = 'n', long, env = "RR_PROCS", default_value_t = DEFAULT_PROCS)]
    pub procs: usize,

    /// Wall-clock length of one tick in milliseconds.
    #[arg(long, env = "RR_TICK_MS", default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Seed for the scheduler and worker RNGs. Omit for OS entropy.
    #[arg(long, env = "RR_SEED")]
    pub seed: Option<u64>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    pub quantum: Ticks,
    pub procs: usize,
    pub tick: Duration,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            procs: DEFAULT_PROCS,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn validate(self) -> Result<Self, SimError> {
        if self.quantum == 0 {
            return Err(SimError::Config("quantum must be at least 1 tick".into()));
        }
        if self.procs == 0 {
            return Err(SimError::Config("at least one process is required".into()));
        }
        if self.tick.is_zero() {
            return Err(SimError::Config("tick length must be non-zero".into()));
        }
        Ok(self)
    }
}

impl TryFrom<&Cli> for SimConfig {
    type Error = SimError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        SimConfig {
            quantum: parse_quantum(cli.quantum.as_deref()),
            procs: cli.procs,
            tick: Duration::from_millis(cli.tick_ms),
            seed: cli.seed,
        }
        .validate()
    }
}

/// Leading-integer parse: optional sign then digits, trailing junk ignored.
/// Anything that does not yield a positive number becomes the default.
pub fn parse_quantum(raw: Option<&str>) -> Ticks {
    let Some(raw) = raw else {
        return DEFAULT_QUANTUM;
    };

    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<Ticks>() {
        Ok(value) if value > 0 && !negative => value,
        _ => DEFAULT_QUANTUM,
    }
}
