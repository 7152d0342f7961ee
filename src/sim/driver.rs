use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    config::SimConfig,
    core::{Bridge, SchedCore, SchedCoreEvent, spawn_ticker},
    error::SimError,
    stats::Report,
    worker::{ThreadPool, body::stream_rng},
};

/// Wall-clock simulation: a ticker task, one worker thread per process and
/// a controller that sleeps on the bridge between notifications.
pub struct Sim {
    config: SimConfig,
}

impl Sim {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<Report, SimError> {
        let SimConfig {
            quantum,
            procs,
            tick,
            seed,
        } = self.config;

        let bridge = Arc::new(Bridge::new());
        let pool = ThreadPool::new(Arc::clone(&bridge), seed);
        let mut core = SchedCore::new(pool, procs, quantum, stream_rng(seed, 0))?;
        info!(procs, quantum, tick_ms = tick.as_millis() as u64, "simulation started");

        core.start();
        log_events(&mut core);

        let ticker = spawn_ticker(Arc::clone(&bridge), tick);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while !core.all_done() {
            tokio::select! {
                _ = bridge.wait() => {}
                _ = &mut ctrl_c => {
                    ticker.abort();
                    return Err(SimError::Interrupted);
                }
            }

            core.step(&bridge);
            log_events(&mut core);
        }

        ticker.abort();
        info!(
            total_ticks = core.counters.total_ticks,
            ctx_switches = core.counters.ctx_switches,
            idle_ticks = core.counters.idle_ticks,
            "all processes finished"
        );
        Ok(core.report())
    }
}

fn log_events<P: crate::worker::WorkerPool>(core: &mut SchedCore<P>) {
    let now = core.counters.total_ticks;
    for event in core.drain_events() {
        match event {
            SchedCoreEvent::ProcStateChange { proc, from, to } => {
                debug!(t = now, proc, ?from, ?to, "state change")
            }
            SchedCoreEvent::IoBlocked { proc, io } => debug!(t = now, proc, io, "blocked on I/O"),
            SchedCoreEvent::QuantumReset { procs } => debug!(t = now, procs, "quanta reset"),
            SchedCoreEvent::StaleEntryDropped { proc } => {
                debug!(t = now, proc, "stale queue entry dropped")
            }
            SchedCoreEvent::Idle => {}
        }
    }
}
