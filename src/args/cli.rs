use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{RunId, TlsVersion};

use super::parsers::{parse_duration_arg, parse_run_id, parse_tls_version, parse_var};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Embedded HTTP load-test engine: ramp up workers against a shared request budget, watch live stats, and keep a history of runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a settings file (defaults to ./volley.toml or ./volley.json)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite store (overrides store_path from the settings file)
    #[arg(long = "store", env = "VOLLEY_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Execute a load test
    Run(RunArgs),
    /// Manage saved load-test configs
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Inspect recorded runs
    #[command(subcommand)]
    Runs(RunsCommand),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Saved config to run; with --request-file, the name for an ad-hoc config
    pub name: Option<String>,

    /// Request definition file (.toml or .json)
    #[arg(long = "request-file", short = 'f')]
    pub request_file: Option<PathBuf>,

    /// Number of concurrent workers (1-1000)
    #[arg(long = "concurrency", short = 'c')]
    pub concurrency: Option<usize>,

    /// Total number of requests to send
    #[arg(long = "requests", short = 'n')]
    pub requests: Option<u64>,

    /// Time to reach full concurrency (supports ms/s/m/h; rounded up to seconds)
    #[arg(long = "ramp-up", value_parser = parse_duration_arg)]
    pub ramp_up: Option<Duration>,

    /// Maximum run time (supports ms/s/m/h; rounded up to seconds)
    #[arg(long = "duration", short = 'd', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Profile supplying variables and TLS options
    #[arg(long = "profile", short = 'p')]
    pub profile: Option<String>,

    /// Store the ad-hoc config under NAME before running
    #[arg(long = "save")]
    pub save: bool,

    /// Template variable (repeatable, key=value); overrides profile vars
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// How long in-flight requests may run after a stop (supports ms/s/m/h)
    #[arg(long = "grace", value_parser = parse_duration_arg)]
    pub grace: Option<Duration>,

    #[command(flatten)]
    pub tls: TlsArgs,

    /// Summary format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Do not draw the live progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TlsArgs {
    /// Accept invalid certificates and hostnames
    #[arg(long = "insecure", short = 'k')]
    pub insecure: bool,

    /// Additional root certificate (PEM)
    #[arg(long = "cacert")]
    pub cacert: Option<PathBuf>,

    /// Minimum TLS version (1.0, 1.1, 1.2, 1.3)
    #[arg(long = "tls-min", value_parser = parse_tls_version)]
    pub tls_min: Option<TlsVersion>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ConfigCommand {
    /// Create or replace a saved config
    Save(ConfigSaveArgs),
    /// List saved configs
    List,
    /// Delete a saved config
    Delete {
        /// Config name
        name: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ConfigSaveArgs {
    /// Config name
    pub name: String,

    /// Request definition file (.toml or .json)
    #[arg(long = "request-file", short = 'f')]
    pub request_file: PathBuf,

    /// Number of concurrent workers (1-1000)
    #[arg(long = "concurrency", short = 'c', default_value_t = 10)]
    pub concurrency: usize,

    /// Total number of requests to send
    #[arg(long = "requests", short = 'n', default_value_t = 100)]
    pub requests: u64,

    /// Time to reach full concurrency (supports ms/s/m/h)
    #[arg(long = "ramp-up", value_parser = parse_duration_arg)]
    pub ramp_up: Option<Duration>,

    /// Maximum run time (supports ms/s/m/h)
    #[arg(long = "duration", short = 'd', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Profile supplying variables and TLS options
    #[arg(long = "profile", short = 'p')]
    pub profile: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RunsCommand {
    /// List recorded runs, most recent first
    List {
        /// Only show runs of this profile
        #[arg(long = "profile", short = 'p')]
        profile: Option<String>,

        /// Maximum number of runs to show
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },
    /// Show one run in detail
    Show {
        /// Run id
        #[arg(value_parser = parse_run_id)]
        id: RunId,

        /// Output format
        #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
