use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, trace};

use crate::domain::{ResolvedRequest, TlsPolicy};
use crate::metrics::{OutcomeKind, StatsAggregator, WorkerOutcome};

use super::RequestExecutor;
use super::budget::RequestBudget;
use super::control::RunControl;

/// State shared by every worker of one run.
pub(super) struct WorkerContext {
    pub(super) request: ResolvedRequest,
    pub(super) tls: Option<TlsPolicy>,
    pub(super) executor: Arc<dyn RequestExecutor>,
    pub(super) budget: RequestBudget,
    pub(super) control: RunControl,
    pub(super) stats: StatsAggregator,
    pub(super) live_workers: AtomicUsize,
}

impl WorkerContext {
    pub(super) fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }
}

/// Counts a worker task as alive from spawn until it exits.
pub(super) struct LiveWorker {
    context: Arc<WorkerContext>,
}

impl LiveWorker {
    pub(super) fn enter(context: Arc<WorkerContext>) -> Self {
        context.live_workers.fetch_add(1, Ordering::AcqRel);
        context.stats.note_worker_spawned();
        Self { context }
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.context.live_workers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Claims budget and executes requests until the budget, the deadline, or a
/// stop ends the loop. A forced cancellation drops the in-flight call without
/// recording an outcome.
pub(super) async fn run_worker(worker: LiveWorker, worker_id: usize) {
    let context = Arc::clone(&worker.context);
    let mut abort = context.control.cancel_signal();
    let mut served: u64 = 0;

    loop {
        if context.control.should_stop_claiming() || !context.budget.try_claim() {
            break;
        }

        let active = context.stats.begin_request();
        let result = tokio::select! {
            biased;
            () = abort.cancelled() => {
                debug!(worker_id, "In-flight request cancelled");
                break;
            }
            result = context.executor.execute(
                &context.request,
                context.tls.as_ref(),
                context.control.cancel_signal(),
            ) => result,
        };
        drop(active);

        if let Some(error) = result.error.as_deref()
            && result.kind != OutcomeKind::Success
        {
            trace!(worker_id, kind = ?result.kind, "Request failed: {}", error);
        }
        context
            .stats
            .record(&WorkerOutcome::new(result.latency, result.kind));
        served = served.saturating_add(1);
    }

    debug!(worker_id, served, "Worker exiting");
    drop(worker);
}
