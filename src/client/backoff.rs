//! Jittered reconnect delays.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Produces reconnect delays drawn uniformly from `[0, max_delay)`.
///
/// Retries are unbounded and the window never grows; the jitter only
/// spreads reconnects from many clients after a shared server restart.
#[derive(Debug)]
pub struct ReconnectJitter {
    max_delay: Duration,
    rng: StdRng,
}

impl ReconnectJitter {
    pub fn new(max_delay: Duration) -> Self {
        Self {
            max_delay,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence, for tests and reproducible runs.
    pub fn with_seed(max_delay: Duration, seed: u64) -> Self {
        Self {
            max_delay,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn next_delay(&mut self) -> Duration {
        let max_us = self.max_delay.as_micros().min(u128::from(u64::MAX)) as u64;
        if max_us == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.rng.gen_range(0..max_us))
    }
}
