use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info, warn};

use crate::domain::{ExecutionConfig, Run, RunId, RunStatus};
use crate::error::{AppError, AppResult, ExecutionError};
use crate::metrics::{Stats, StatsAggregator};
use crate::store::RunStore;

use super::RequestExecutor;
use super::budget::RequestBudget;
use super::control::RunControl;
use super::ramp::target_workers;
use super::worker::{LiveWorker, WorkerContext, run_worker};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Running,
    /// Budget or deadline exhausted; waiting for in-flight requests.
    Completing,
    /// Stop requested; waiting for in-flight requests.
    Cancelling,
    Finished,
}

impl ExecutorState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutorState::Idle => "idle",
            ExecutorState::Running => "running",
            ExecutorState::Completing => "completing",
            ExecutorState::Cancelling => "cancelling",
            ExecutorState::Finished => "finished",
        }
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    /// How often the ramp-up loop re-evaluates the worker target.
    pub tick_interval: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

struct RunState {
    context: Arc<WorkerContext>,
    run: Mutex<Run>,
    abort_error: Mutex<Option<String>>,
}

impl RunState {
    fn lock_run(&self) -> MutexGuard<'_, Run> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_abort_error(&self) -> MutexGuard<'_, Option<String>> {
        self.abort_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

struct Shared {
    config: ExecutionConfig,
    request_executor: Arc<dyn RequestExecutor>,
    store: Arc<dyn RunStore>,
    settings: ExecutorSettings,
    lifecycle: Mutex<ExecutorState>,
    run_state: OnceLock<RunState>,
    finished_tx: watch::Sender<bool>,
}

impl Shared {
    fn lock_lifecycle(&self) -> MutexGuard<'_, ExecutorState> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_finished(&self) -> bool {
        *self.finished_tx.borrow()
    }
}

/// Drives one load-test run.
///
/// `start` returns immediately; a supervisor task ramps the worker pool up and
/// finalizes the [`Run`] once every worker has exited. Hosts poll [`stats`]
/// and [`is_execution_complete`], or await [`wait`].
///
/// [`stats`]: Executor::stats
/// [`is_execution_complete`]: Executor::is_execution_complete
/// [`wait`]: Executor::wait
pub struct Executor {
    shared: Arc<Shared>,
}

impl Executor {
    #[must_use]
    pub fn new(
        config: ExecutionConfig,
        request_executor: Arc<dyn RequestExecutor>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self::with_settings(config, request_executor, store, ExecutorSettings::default())
    }

    #[must_use]
    pub fn with_settings(
        config: ExecutionConfig,
        request_executor: Arc<dyn RequestExecutor>,
        store: Arc<dyn RunStore>,
        settings: ExecutorSettings,
    ) -> Self {
        let (finished_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                request_executor,
                store,
                settings,
                lifecycle: Mutex::new(ExecutorState::Idle),
                run_state: OnceLock::new(),
                finished_tx,
            }),
        }
    }

    /// Validates the configuration and launches the run.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range config,
    /// `ExecutionError::NoRuntime` outside a Tokio runtime, and
    /// `ExecutionError::AlreadyStarted` on a second call. No run is created
    /// in any of these cases.
    pub fn start(&self) -> AppResult<RunId> {
        let shared = &self.shared;
        let load = &shared.config.config;
        load.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            debug!("No Tokio runtime available: {}", err);
            AppError::execution(ExecutionError::NoRuntime)
        })?;

        {
            let mut lifecycle = shared.lock_lifecycle();
            if *lifecycle != ExecutorState::Idle {
                return Err(AppError::execution(ExecutionError::AlreadyStarted));
            }
            *lifecycle = ExecutorState::Running;
        }

        let deadline = load
            .max_duration()
            .and_then(|duration| Instant::now().checked_add(duration));
        let context = Arc::new(WorkerContext {
            request: shared.config.request.clone(),
            tls: shared.config.tls.clone(),
            executor: Arc::clone(&shared.request_executor),
            budget: RequestBudget::new(load.total_requests),
            control: RunControl::new(deadline),
            stats: StatsAggregator::new(load.total_requests, load.concurrency),
            live_workers: AtomicUsize::new(0),
        });
        let run = Run::start(load, context.stats.snapshot());
        let run_id = run.id;

        if shared
            .run_state
            .set(RunState {
                context,
                run: Mutex::new(run),
                abort_error: Mutex::new(None),
            })
            .is_err()
        {
            return Err(AppError::execution(ExecutionError::AlreadyStarted));
        }

        info!(
            run_id = %run_id,
            config = %load.name,
            concurrency = load.concurrency,
            total_requests = load.total_requests,
            ramp_up_secs = load.ramp_up_secs,
            duration_secs = load.duration_secs,
            "Load test started"
        );
        runtime.spawn(supervise(Arc::clone(&self.shared)));
        Ok(run_id)
    }

    #[must_use]
    pub fn state(&self) -> ExecutorState {
        *self.shared.lock_lifecycle()
    }

    /// Current statistics; zeroed before `start`.
    #[must_use]
    pub fn stats(&self) -> Stats {
        let load = &self.shared.config.config;
        self.shared.run_state.get().map_or_else(
            || Stats::idle(load.total_requests, load.concurrency),
            |state| state.context.stats.snapshot(),
        )
    }

    /// The run record, once `start` has created it.
    #[must_use]
    pub fn run(&self) -> Option<Run> {
        self.shared
            .run_state
            .get()
            .map(|state| state.lock_run().clone())
    }

    /// Non-blocking completion check for hosts that poll.
    #[must_use]
    pub fn is_execution_complete(&self) -> bool {
        let Some(state) = self.shared.run_state.get() else {
            return false;
        };
        if self.shared.is_finished() {
            return true;
        }
        let context = &state.context;
        let work_over = context.budget.is_exhausted() || context.control.should_stop_claiming();
        work_over && context.live_workers() == 0
    }

    /// Resolves once the run has been finalized. Returns immediately when the
    /// executor was never started.
    pub async fn wait(&self) {
        if self.shared.run_state.get().is_none() {
            return;
        }
        let mut finished = self.shared.finished_tx.subscribe();
        wait_finished(&mut finished).await;
    }

    /// Stops the run: no new requests are claimed, and in-flight requests get
    /// `grace` to finish before they are cancelled.
    ///
    /// Safe to call repeatedly, concurrently, before `start`, or after the run
    /// finished; the run is finalized exactly once either way. Only the first
    /// call's `grace` applies: later calls wait, without a bound of their own,
    /// until that first stop has finalized the run.
    ///
    /// A stop that arrives after the budget or deadline already ran out leaves
    /// the run `completed`; otherwise it finalizes as `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::StopTimeout` when in-flight requests had to be
    /// cancelled. The run is still finalized with the stats gathered so far.
    pub async fn stop(&self, grace: Duration) -> AppResult<()> {
        let Some(state) = self.shared.run_state.get() else {
            return Ok(());
        };
        let control = &state.context.control;
        let first = control.request_stop();
        if first {
            let mut lifecycle = self.shared.lock_lifecycle();
            if *lifecycle == ExecutorState::Running {
                *lifecycle = if work_exhausted(&state.context) {
                    ExecutorState::Completing
                } else {
                    ExecutorState::Cancelling
                };
            }
            let current = *lifecycle;
            info!(
                state = %current,
                grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                "Stop requested"
            );
        }

        let mut finished = self.shared.finished_tx.subscribe();
        if timeout(grace, wait_finished(&mut finished)).await.is_ok() {
            return Ok(());
        }
        if !first {
            wait_finished(&mut finished).await;
            return Ok(());
        }

        let err = ExecutionError::StopTimeout {
            grace,
            in_flight: state.context.stats.active_requests(),
        };
        warn!("{}", err);
        *state.lock_abort_error() = Some(err.to_string());
        control.abort();
        wait_finished(&mut finished).await;
        Err(AppError::execution(err))
    }
}

async fn wait_finished(finished: &mut watch::Receiver<bool>) {
    let closed = finished.wait_for(|done| *done).await.is_err();
    if closed {
        debug!("Executor dropped before the run finished");
    }
}

async fn supervise(shared: Arc<Shared>) {
    let Some(state) = shared.run_state.get() else {
        return;
    };
    let context = Arc::clone(&state.context);
    let concurrency = shared.config.config.concurrency;
    let ramp_up = shared.config.config.ramp_up();
    let started = Instant::now();
    let mut stop_rx = context.control.stop_receiver();
    let mut ticker = interval(shared.settings.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut workers = JoinSet::new();
    let mut spawned: usize = 0;

    while spawned < concurrency {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = stop_rx.changed() => {},
            Some(joined) = workers.join_next(), if !workers.is_empty() => {
                log_worker_exit(joined);
            }
        }

        if context.control.should_stop_claiming() || context.budget.is_exhausted() {
            break;
        }

        let target = target_workers(started.elapsed(), concurrency, ramp_up);
        while spawned < target {
            spawned = spawned.saturating_add(1);
            let worker = LiveWorker::enter(Arc::clone(&context));
            workers.spawn(run_worker(worker, spawned));
        }
        if spawned > 0 {
            debug!(spawned, target, "Ramp-up tick");
        }
    }

    loop {
        mark_completing_if_exhausted(&shared, &context);
        tokio::select! {
            joined = workers.join_next() => match joined {
                Some(joined) => log_worker_exit(joined),
                None => break,
            },
            _ = ticker.tick() => {}
        }
    }

    {
        let mut lifecycle = shared.lock_lifecycle();
        if *lifecycle == ExecutorState::Running {
            *lifecycle = if context.control.is_stop_requested() && !work_exhausted(&context) {
                ExecutorState::Cancelling
            } else {
                ExecutorState::Completing
            };
        }
    }

    finalize(&shared, state).await;
}

/// The budget is fully claimed or the deadline passed.
fn work_exhausted(context: &WorkerContext) -> bool {
    context.budget.is_exhausted() || context.control.deadline_passed()
}

/// Workers still draining in-flight requests no longer count as running once
/// the work itself ran out. A pending stop keeps its `Cancelling` state.
fn mark_completing_if_exhausted(shared: &Shared, context: &WorkerContext) {
    if !work_exhausted(context) {
        return;
    }
    let mut lifecycle = shared.lock_lifecycle();
    if *lifecycle == ExecutorState::Running {
        *lifecycle = ExecutorState::Completing;
        debug!("Request budget or deadline exhausted; draining in-flight requests");
    }
}

fn log_worker_exit(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        warn!("Worker task ended abnormally: {}", err);
    }
}

async fn finalize(shared: &Shared, state: &RunState) {
    let context = &state.context;
    context.stats.freeze();

    let status = if context.control.is_aborted() {
        RunStatus::CancelTimeout
    } else if *shared.lock_lifecycle() == ExecutorState::Cancelling {
        RunStatus::Cancelled
    } else {
        RunStatus::Completed
    };
    let error = if status == RunStatus::CancelTimeout {
        state.lock_abort_error().clone()
    } else {
        None
    };
    let stats = context.stats.snapshot();

    let run = {
        let mut run = state.lock_run();
        run.finish(status, stats, error);
        run.clone()
    };

    if let Err(err) = shared.store.save_run(&run).await {
        error!(run_id = %run.id, "Failed to persist run: {}", err);
    }

    *shared.lock_lifecycle() = ExecutorState::Finished;
    info!(
        run_id = %run.id,
        status = %run.status,
        completed = run.stats.completed,
        success = run.stats.success,
        network_errors = run.stats.network_errors,
        validation_errors = run.stats.validation_errors,
        claimed = context.budget.claimed(),
        "Load test finished"
    );
    shared.finished_tx.send_replace(true);
}
