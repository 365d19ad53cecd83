use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::args::{OutputFormat, RunArgs, TlsArgs};
use crate::config::{load_request_file, whole_seconds};
use crate::domain::{ExecutionConfig, LoadTestConfig, TlsPolicy};
use crate::engine::Executor;
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::HttpExecutor;
use crate::store::RunStore;
use crate::system::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

use super::context::AppContext;
use super::progress::ProgressLine;
use super::summary::{format_run_json, format_run_text};

pub(crate) const AD_HOC_CONFIG_NAME: &str = "ad-hoc";
pub(crate) const DEFAULT_CONCURRENCY: usize = 10;
pub(crate) const DEFAULT_TOTAL_REQUESTS: u64 = 100;

/// Runs one load test in the foreground and prints its summary.
///
/// # Errors
///
/// Returns an error when the config or request cannot be resolved, the run
/// cannot start, or a stop had to cancel in-flight requests.
pub(crate) async fn run_load_test(ctx: &AppContext, args: &RunArgs, no_color: bool) -> AppResult<()> {
    let store = ctx.open_store().await?;
    let base = match (args.request_file.as_deref(), args.name.as_deref()) {
        (Some(path), name) => ad_hoc_config(ctx, path, name),
        (None, Some(name)) => store.get_config(name).await?.ok_or_else(|| {
            AppError::validation(ValidationError::UnknownConfig {
                name: name.to_owned(),
            })
        })?,
        (None, None) => return Err(AppError::validation(ValidationError::MissingRequestFile)),
    };
    let config = apply_run_overrides(base, args);
    config.validate()?;
    if args.save {
        store.save_config(&config).await?;
        info!(config = %config.name, "Saved config");
    }

    let profile = ctx.profile(&config.profile)?;
    let vars = merge_vars(&profile.vars, &args.vars);
    let request = load_request_file(Path::new(&config.request_file), None)?.resolve(&vars)?;
    let tls = merge_tls(&profile.tls, &args.tls);
    let http = Arc::new(HttpExecutor::new());
    http.prepare(tls.as_ref())?;
    let grace = ctx.grace_period(args.grace)?;

    let executor = Executor::with_settings(
        ExecutionConfig {
            config,
            request,
            tls,
        },
        http,
        store,
        ctx.executor_settings(),
    );
    let run_id = executor.start()?;
    debug!(run_id = %run_id, "Waiting for run");

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let mut progress = ProgressLine::new(
        !args.no_progress && args.output_format == OutputFormat::Text,
        no_color,
    );
    let mut ticker = interval(ctx.progress_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let stop_result = loop {
        tokio::select! {
            () = executor.wait() => break Ok(()),
            _ = shutdown_rx.recv() => break executor.stop(grace).await,
            _ = ticker.tick() => {
                if let Err(err) = progress.render(&executor.stats()) {
                    debug!("Progress line failed: {}", err);
                }
            }
        }
    };

    if shutdown_tx.send(()).is_err() {
        debug!("Signal handler already stopped");
    }
    signal_handle.await?;
    if let Err(err) = progress.render(&executor.stats()).and_then(|()| progress.finish()) {
        debug!("Progress line failed: {}", err);
    }

    if let Some(run) = executor.run() {
        match args.output_format {
            OutputFormat::Text => print!("{}", format_run_text(&run)),
            OutputFormat::Json => println!("{}", format_run_json(&run)?),
        }
    }
    stop_result
}

fn ad_hoc_config(ctx: &AppContext, request_file: &Path, name: Option<&str>) -> LoadTestConfig {
    LoadTestConfig {
        name: name.unwrap_or(AD_HOC_CONFIG_NAME).to_owned(),
        request_file: request_file.to_string_lossy().into_owned(),
        concurrency: DEFAULT_CONCURRENCY,
        total_requests: DEFAULT_TOTAL_REQUESTS,
        ramp_up_secs: 0,
        duration_secs: 0,
        profile: ctx.default_profile().to_owned(),
    }
}

/// CLI flags win over the saved or ad-hoc values.
pub(crate) fn apply_run_overrides(mut config: LoadTestConfig, args: &RunArgs) -> LoadTestConfig {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(requests) = args.requests {
        config.total_requests = requests;
    }
    if let Some(ramp_up) = args.ramp_up {
        config.ramp_up_secs = whole_seconds(ramp_up);
    }
    if let Some(duration) = args.duration {
        config.duration_secs = whole_seconds(duration);
    }
    if let Some(profile) = args.profile.as_ref() {
        config.profile.clone_from(profile);
    }
    config
}

/// `--var` values override profile variables with the same name.
pub(crate) fn merge_vars(
    profile_vars: &BTreeMap<String, String>,
    cli_vars: &[(String, String)],
) -> BTreeMap<String, String> {
    let mut vars = profile_vars.clone();
    vars.extend(cli_vars.iter().cloned());
    vars
}

/// Combines profile and CLI TLS options; `None` means library defaults.
pub(crate) fn merge_tls(profile: &TlsPolicy, cli: &TlsArgs) -> Option<TlsPolicy> {
    let policy = TlsPolicy {
        insecure: profile.insecure || cli.insecure,
        cacert: cli.cacert.clone().or_else(|| profile.cacert.clone()),
        tls_min: cli.tls_min.or(profile.tls_min),
    };
    (policy != TlsPolicy::default()).then_some(policy)
}
