use clap::Parser;

use crate::app;
use crate::args::Cli;
use crate::error::AppResult;

/// Parses the command line, installs logging, and runs the command on a
/// multi-threaded Tokio runtime.
///
/// # Errors
///
/// Returns an error when the runtime cannot be built or the command fails.
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    crate::system::logger::init_logging(cli.verbose, cli.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(app::dispatch(cli))
}
