//! Burst-then-drain dispatch pacing

use std::time::Duration;

use crate::config::SessionConfig;

/// Fixed lookahead schedule: the first `burst_bucket_size` admissions go out
/// immediately, later ones are delayed linearly so the remote service sees
/// `throughput_per_second` uploads per second. The delay is computed once at
/// admission and never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    burst_bucket_size: usize,
    throughput_per_second: u64,
}

impl PacingPolicy {
    pub fn new(burst_bucket_size: usize, throughput_per_second: u64) -> Self {
        Self {
            burst_bucket_size,
            throughput_per_second: throughput_per_second.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.burst_bucket_size, config.throughput_per_second)
    }

    pub fn burst_bucket_size(&self) -> usize {
        self.burst_bucket_size
    }

    pub fn throughput_per_second(&self) -> u64 {
        self.throughput_per_second
    }

    /// Dispatch delay for the job with the given 1-based admission count
    pub fn delay_for(&self, admitted_count: usize) -> Duration {
        if admitted_count <= self.burst_bucket_size {
            return Duration::ZERO;
        }

        let overflow = (admitted_count - self.burst_bucket_size) as u64;
        Duration::from_millis(overflow * 1000 / self.throughput_per_second)
    }
}
