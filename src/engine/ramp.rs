use std::time::Duration;

/// Number of workers that should be running `elapsed` into a run.
///
/// Grows linearly from 1 at the start to `concurrency_target` once
/// `ramp_up` has passed, using floor rounding on whole milliseconds. A zero
/// ramp-up returns the full target immediately. The result never decreases as
/// `elapsed` grows.
#[must_use]
pub fn target_workers(elapsed: Duration, concurrency_target: usize, ramp_up: Duration) -> usize {
    if concurrency_target == 0 {
        return 0;
    }
    let ramp_ms = ramp_up.as_millis();
    if ramp_ms == 0 {
        return concurrency_target;
    }

    let elapsed_ms = elapsed.as_millis().min(ramp_ms);
    let extra_workers = u128::try_from(concurrency_target.saturating_sub(1)).unwrap_or(u128::MAX);
    let step = extra_workers
        .saturating_mul(elapsed_ms)
        .checked_div(ramp_ms)
        .unwrap_or(0);
    let step = usize::try_from(step).unwrap_or(usize::MAX);

    step.saturating_add(1).min(concurrency_target)
}
