//! Outcome accounting, latency histograms, and stats snapshots.
mod histogram;
mod stats;
mod types;


pub use histogram::{LatencyHistogram, Percentiles};
pub use stats::{ActiveRequestGuard, StatsAggregator};
pub use types::{OutcomeKind, Stats, WorkerOutcome};
