use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Success,
    /// No usable response arrived (connect, TLS, timeout, body read).
    NetworkError,
    /// A response arrived but did not meet the request's expectations.
    ValidationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOutcome {
    pub latency: Duration,
    pub kind: OutcomeKind,
}

impl WorkerOutcome {
    #[must_use]
    pub const fn new(latency: Duration, kind: OutcomeKind) -> Self {
        Self { latency, kind }
    }
}

/// Point-in-time view of a run. Latencies are in microseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_requests: u64,
    pub completed: u64,
    pub success: u64,
    pub network_errors: u64,
    pub validation_errors: u64,
    pub active_workers: usize,
    pub spawned_workers: usize,
    pub concurrency_target: usize,
    pub elapsed_ms: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
    pub avg_latency_us: u64,
    pub p50_latency_us: u64,
    pub p95_latency_us: u64,
    pub p99_latency_us: u64,
}

impl Stats {
    /// Snapshot for a run that has not started yet.
    #[must_use]
    pub fn idle(total_requests: u64, concurrency_target: usize) -> Self {
        Self {
            total_requests,
            concurrency_target,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total_requests.saturating_sub(self.completed)
    }

    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.network_errors.saturating_add(self.validation_errors)
    }

    /// Completed requests per second, scaled by 100.
    #[must_use]
    pub fn throughput_x100(&self) -> u64 {
        if self.elapsed_ms == 0 {
            return 0;
        }
        let scaled = u128::from(self.completed)
            .saturating_mul(100_000)
            .checked_div(u128::from(self.elapsed_ms))
            .unwrap_or(0);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Percentage of completed requests that succeeded, scaled by 100.
    #[must_use]
    pub fn success_rate_x100(&self) -> u64 {
        ratio_x100(self.success, self.completed)
    }

    #[must_use]
    pub fn network_error_rate_x100(&self) -> u64 {
        ratio_x100(self.network_errors, self.completed)
    }

    #[must_use]
    pub fn validation_error_rate_x100(&self) -> u64 {
        ratio_x100(self.validation_errors, self.completed)
    }

    /// Counter relationships every snapshot must satisfy.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let classified = self
            .success
            .saturating_add(self.network_errors)
            .saturating_add(self.validation_errors);
        let latency_ordered = self.completed == 0
            || (self.min_latency_us <= self.p50_latency_us
                && self.p50_latency_us <= self.p95_latency_us
                && self.p95_latency_us <= self.p99_latency_us
                && self.p99_latency_us <= self.max_latency_us);
        classified == self.completed
            && self.completed <= self.total_requests
            && self.active_workers <= self.concurrency_target
            && latency_ordered
    }
}

fn ratio_x100(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    let scaled = u128::from(part)
        .saturating_mul(10_000)
        .checked_div(u128::from(whole))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
