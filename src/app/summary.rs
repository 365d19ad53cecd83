use crate::domain::{LoadTestConfig, Run};
use crate::error::AppResult;
use crate::metrics::Stats;

/// Multi-line report for a finished (or recorded) run.
#[must_use]
pub fn format_run_text(run: &Run) -> String {
    let stats = &run.stats;
    let mut lines = vec![
        format!("Run: {}", run.id),
        format!("Config: {} (profile: {})", run.config_name, run.profile),
        format!("Status: {}", run.status),
    ];
    if let Some(error) = run.error.as_deref() {
        lines.push(format!("Error: {}", error));
    }
    lines.extend([
        format!("Started: {}", run.started_at.to_rfc3339()),
        format!("Duration: {}", format_millis(stats.elapsed_ms)),
        format!(
            "Requests: {} of {} completed, {} remaining",
            stats.completed,
            stats.total_requests,
            stats.remaining()
        ),
        format!(
            "Successful: {} ({})",
            stats.success,
            format_percent(stats.success_rate_x100())
        ),
        format!(
            "Network Errors: {} ({})",
            stats.network_errors,
            format_percent(stats.network_error_rate_x100())
        ),
        format!(
            "Validation Errors: {} ({})",
            stats.validation_errors,
            format_percent(stats.validation_error_rate_x100())
        ),
        format!("Throughput: {} req/s", format_x100(stats.throughput_x100())),
        format!(
            "Workers: {} spawned / {} target",
            stats.spawned_workers, stats.concurrency_target
        ),
        format_latency_line(stats),
    ]);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Serializes the run record as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn format_run_json(run: &Run) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(run)?)
}

/// One line per run for `runs list`.
#[must_use]
pub fn format_run_row(run: &Run) -> String {
    format!(
        "{}  {}  {:<14}  {:<16} {:<10} {}/{} ok, {}",
        run.id,
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        run.status.as_str(),
        run.config_name,
        run.profile,
        run.stats.success,
        run.stats.completed,
        format_millis(run.stats.elapsed_ms)
    )
}

/// One line per saved config for `config list`.
#[must_use]
pub fn format_config_row(config: &LoadTestConfig) -> String {
    let mut parts = vec![format!(
        "{:<16} {:<10} c={} n={} file={}",
        config.name,
        config.profile,
        config.concurrency,
        config.total_requests,
        config.request_file
    )];
    if config.ramp_up_secs > 0 {
        parts.push(format!("ramp={}s", config.ramp_up_secs));
    }
    if config.duration_secs > 0 {
        parts.push(format!("max={}s", config.duration_secs));
    }
    parts.join(" ")
}

fn format_latency_line(stats: &Stats) -> String {
    if stats.completed == 0 {
        return "Latency: n/a".to_owned();
    }
    format!(
        "Latency: min {} | avg {} | p50 {} | p95 {} | p99 {} | max {}",
        format_micros(stats.min_latency_us),
        format_micros(stats.avg_latency_us),
        format_micros(stats.p50_latency_us),
        format_micros(stats.p95_latency_us),
        format_micros(stats.p99_latency_us),
        format_micros(stats.max_latency_us)
    )
}

pub(crate) fn format_x100(value: u64) -> String {
    format!("{}.{:02}", value / 100, value % 100)
}

pub(crate) fn format_percent(value_x100: u64) -> String {
    format!("{}%", format_x100(value_x100))
}

/// `12345us` renders as `12.34ms`.
pub(crate) fn format_micros(us: u64) -> String {
    format!("{}.{:02}ms", us / 1_000, (us % 1_000) / 10)
}

pub(crate) fn format_millis(ms: u64) -> String {
    format!("{}.{:02}s", ms / 1_000, (ms % 1_000) / 10)
}
