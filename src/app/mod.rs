//! CLI front end: resolves settings, drives the executor, prints results.
mod commands;
mod context;
mod progress;
mod run;
pub mod summary;


pub use context::{
    AppContext, DEFAULT_GRACE_PERIOD, DEFAULT_PROFILE, DEFAULT_PROGRESS_INTERVAL,
    DEFAULT_STORE_PATH,
};

use crate::args::{Cli, Command};
use crate::error::AppResult;

/// Runs the parsed command line to completion.
///
/// # Errors
///
/// Returns the first error the command hit, including a stop that had to
/// cancel in-flight requests.
pub async fn dispatch(cli: Cli) -> AppResult<()> {
    let ctx = AppContext::load(&cli)?;
    match cli.command {
        Command::Run(args) => run::run_load_test(&ctx, &args, cli.no_color).await,
        Command::Config(command) => commands::run_config_command(&ctx, command).await,
        Command::Runs(command) => commands::run_runs_command(&ctx, &command).await,
    }
}
