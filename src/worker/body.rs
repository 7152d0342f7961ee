//! Worker-side protocol.
//!
//! A worker owns a private burst countdown drawn from `[BURST_MIN, BURST_MAX]`.
//! Each run-step burns one unit; when the burst is spent the worker either
//! asks for I/O (and exits on the following run-step) or exits at once.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::core::Ticks;

pub const BURST_MIN: Ticks = 1;
pub const BURST_MAX: Ticks = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerAction {
    Continue,
    RequestIo,
    Exit,
}

/// Source of the block-on-I/O decision made when a burst runs out.
#[derive(Debug)]
pub enum IoChoice {
    Random(StdRng),
    Always,
    Never,
}

impl IoChoice {
    fn wants_io(&mut self) -> bool {
        match self {
            IoChoice::Random(rng) => rng.random_bool(0.5),
            IoChoice::Always => true,
            IoChoice::Never => false,
        }
    }
}

#[derive(Debug)]
pub struct WorkerBody {
    burst: Ticks,
    exit_after_io: bool,
    choice: IoChoice,
}

impl WorkerBody {
    pub fn random(mut rng: StdRng) -> Self {
        let burst = rng.random_range(BURST_MIN..=BURST_MAX);
        Self {
            burst,
            exit_after_io: false,
            choice: IoChoice::Random(rng),
        }
    }

    /// Fixed burst and fixed I/O decision, for reproducible scenarios.
    pub fn scripted(burst: Ticks, wants_io: bool) -> Self {
        Self {
            burst,
            exit_after_io: false,
            choice: if wants_io {
                IoChoice::Always
            } else {
                IoChoice::Never
            },
        }
    }

    pub fn burst_remaining(&self) -> Ticks {
        self.burst
    }

    pub fn on_run_step(&mut self) -> WorkerAction {
        if self.exit_after_io {
            return WorkerAction::Exit;
        }

        self.burst = self.burst.saturating_sub(1);
        if self.burst > 0 {
            return WorkerAction::Continue;
        }

        if self.choice.wants_io() {
            self.exit_after_io = true;
            WorkerAction::RequestIo
        } else {
            WorkerAction::Exit
        }
    }
}

/// RNG for one stream of a run. Streams derived from the same seed are
/// distinct; without a seed every stream draws from OS entropy.
pub fn stream_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continues_until_burst_is_spent() {
        let mut body = WorkerBody::scripted(3, false);
        assert_eq!(body.on_run_step(), WorkerAction::Continue);
        assert_eq!(body.on_run_step(), WorkerAction::Continue);
        assert_eq!(body.on_run_step(), WorkerAction::Exit);
    }

    #[test]
    fn io_request_is_followed_by_exit() {
        let mut body = WorkerBody::scripted(1, true);
        assert_eq!(body.on_run_step(), WorkerAction::RequestIo);
        assert_eq!(body.on_run_step(), WorkerAction::Exit);
    }

    #[test]
    fn empty_burst_decides_on_first_step() {
        let mut body = WorkerBody::scripted(0, false);
        assert_eq!(body.on_run_step(), WorkerAction::Exit);
    }

    #[test]
    fn random_burst_is_in_range() {
        for stream in 0..64 {
            let body = WorkerBody::random(stream_rng(Some(7), stream));
            assert!((BURST_MIN..=BURST_MAX).contains(&body.burst_remaining()));
        }
    }

    #[test]
    fn random_worker_always_finishes() {
        for stream in 0..64 {
            let mut body = WorkerBody::random(stream_rng(Some(11), stream));
            let steps = (0..=BURST_MAX + 1)
                .position(|_| body.on_run_step() == WorkerAction::Exit)
                .expect("worker never exited");
            assert!(steps as Ticks <= BURST_MAX);
        }
    }

    #[test]
    fn seeded_streams_are_reproducible() {
        let a = WorkerBody::random(stream_rng(Some(42), 3)).burst_remaining();
        let b = WorkerBody::random(stream_rng(Some(42), 3)).burst_remaining();
        assert_eq!(a, b);
    }
}
