use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::{LatencyHistogram, OutcomeKind, Stats, WorkerOutcome};

const RUNNING: u64 = u64::MAX;

/// Shared accumulator for every worker of one run.
///
/// Counters are independent atomics. The histogram sits behind its own lock so
/// percentile bookkeeping never blocks budget claims or counter updates.
/// `completed` is derived from the three outcome counters, which keeps
/// `success + network_errors + validation_errors == completed` on every
/// snapshot.
pub struct StatsAggregator {
    total_requests: u64,
    concurrency_target: usize,
    started: Instant,
    frozen_elapsed_ms: AtomicU64,
    success: AtomicU64,
    network_errors: AtomicU64,
    validation_errors: AtomicU64,
    active_workers: AtomicUsize,
    spawned_workers: AtomicUsize,
    min_latency_us: AtomicU64,
    max_latency_us: AtomicU64,
    latency_sum_us: AtomicU64,
    histogram: Mutex<Option<LatencyHistogram>>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(total_requests: u64, concurrency_target: usize) -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };

        Self {
            total_requests,
            concurrency_target,
            started: Instant::now(),
            frozen_elapsed_ms: AtomicU64::new(RUNNING),
            success: AtomicU64::new(0),
            network_errors: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            active_workers: AtomicUsize::new(0),
            spawned_workers: AtomicUsize::new(0),
            min_latency_us: AtomicU64::new(u64::MAX),
            max_latency_us: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            histogram: Mutex::new(histogram),
        }
    }

    pub fn record(&self, outcome: &WorkerOutcome) {
        let latency_us = duration_to_us(outcome.latency);
        self.min_latency_us.fetch_min(latency_us, Ordering::AcqRel);
        self.max_latency_us.fetch_max(latency_us, Ordering::AcqRel);
        self.latency_sum_us.fetch_add(latency_us, Ordering::AcqRel);

        if let Some(histogram) = self.lock_histogram().as_mut()
            && let Err(err) = histogram.record(latency_us)
        {
            debug!("Dropped latency sample: {}", err);
        }

        // Release pairs with the Acquire loads in `snapshot`; anything written
        // above is visible once this count is.
        self.counter(outcome.kind).fetch_add(1, Ordering::Release);
    }

    /// Marks one request as in flight until the guard drops.
    #[must_use]
    pub fn begin_request(&self) -> ActiveRequestGuard<'_> {
        self.active_workers.fetch_add(1, Ordering::AcqRel);
        ActiveRequestGuard {
            counter: &self.active_workers,
        }
    }

    pub fn note_worker_spawned(&self) {
        self.spawned_workers.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn active_requests(&self) -> usize {
        self.active_workers.load(Ordering::Acquire)
    }

    /// Stops the elapsed clock so later snapshots report the final duration.
    pub fn freeze(&self) {
        let elapsed_ms = duration_to_ms(self.started.elapsed()).min(RUNNING.saturating_sub(1));
        // A second freeze keeps the first elapsed value.
        self.frozen_elapsed_ms
            .compare_exchange(RUNNING, elapsed_ms, Ordering::AcqRel, Ordering::Acquire)
            .ok();
    }

    #[must_use]
    pub fn snapshot(&self) -> Stats {
        let success = self.success.load(Ordering::Acquire);
        let network_errors = self.network_errors.load(Ordering::Acquire);
        let validation_errors = self.validation_errors.load(Ordering::Acquire);
        let completed = success
            .saturating_add(network_errors)
            .saturating_add(validation_errors);

        let (min_latency_us, max_latency_us, avg_latency_us) = if completed == 0 {
            (0, 0, 0)
        } else {
            let min = self.min_latency_us.load(Ordering::Acquire);
            let max = self.max_latency_us.load(Ordering::Acquire);
            let sum = self.latency_sum_us.load(Ordering::Acquire);
            let avg = sum.checked_div(completed).unwrap_or(0);
            (min, max.max(min), avg.max(min).min(max.max(min)))
        };

        let percentiles = if completed == 0 {
            super::Percentiles::default()
        } else {
            self.lock_histogram()
                .as_ref()
                .map(LatencyHistogram::percentiles)
                .unwrap_or_default()
        };
        // The histogram rounds to bucket edges and may hold samples recorded
        // after the counters were read; clamp into the observed range.
        let clamp = |value: u64| value.max(min_latency_us).min(max_latency_us);

        let elapsed_ms = match self.frozen_elapsed_ms.load(Ordering::Acquire) {
            RUNNING => duration_to_ms(self.started.elapsed()),
            frozen => frozen,
        };

        Stats {
            total_requests: self.total_requests,
            completed,
            success,
            network_errors,
            validation_errors,
            active_workers: self.active_workers.load(Ordering::Acquire),
            spawned_workers: self.spawned_workers.load(Ordering::Acquire),
            concurrency_target: self.concurrency_target,
            elapsed_ms,
            min_latency_us,
            max_latency_us,
            avg_latency_us,
            p50_latency_us: clamp(percentiles.p50),
            p95_latency_us: clamp(percentiles.p95),
            p99_latency_us: clamp(percentiles.p99),
        }
    }

    const fn counter(&self, kind: OutcomeKind) -> &AtomicU64 {
        match kind {
            OutcomeKind::Success => &self.success,
            OutcomeKind::NetworkError => &self.network_errors,
            OutcomeKind::ValidationError => &self.validation_errors,
        }
    }

    fn lock_histogram(&self) -> MutexGuard<'_, Option<LatencyHistogram>> {
        self.histogram
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the active-request count on drop, including when the request
/// future is cancelled.
pub struct ActiveRequestGuard<'counter> {
    counter: &'counter AtomicUsize,
}

impl Drop for ActiveRequestGuard<'_> {
    fn drop(&mut self) {
        loop {
            let current = self.counter.load(Ordering::Acquire);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if self
                .counter
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }
}

fn duration_to_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
