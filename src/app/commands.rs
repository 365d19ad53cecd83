use crate::args::{ConfigCommand, ConfigSaveArgs, OutputFormat, RunsCommand};
use crate::config::whole_seconds;
use crate::domain::LoadTestConfig;
use crate::error::{AppError, AppResult, ValidationError};
use crate::store::RunStore;

use super::context::AppContext;
use super::summary::{format_config_row, format_run_json, format_run_row, format_run_text};

/// # Errors
///
/// Returns an error when the store fails or the named config is invalid or
/// missing.
pub(crate) async fn run_config_command(ctx: &AppContext, command: ConfigCommand) -> AppResult<()> {
    let store = ctx.open_store().await?;
    match command {
        ConfigCommand::Save(args) => {
            let config = config_from_args(ctx, args);
            store.save_config(&config).await?;
            println!("Saved config '{}'.", config.name);
        }
        ConfigCommand::List => {
            let configs = store.list_configs().await?;
            if configs.is_empty() {
                println!("No saved configs.");
            }
            for config in &configs {
                println!("{}", format_config_row(config));
            }
        }
        ConfigCommand::Delete { name } => {
            if !store.delete_config(&name).await? {
                return Err(AppError::validation(ValidationError::UnknownConfig { name }));
            }
            println!("Deleted config '{}'.", name);
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error when the store fails or the run does not exist.
pub(crate) async fn run_runs_command(ctx: &AppContext, command: &RunsCommand) -> AppResult<()> {
    let store = ctx.open_store().await?;
    match command {
        RunsCommand::List { profile, limit } => {
            let runs = store.list_runs(profile.as_deref()).await?;
            if runs.is_empty() {
                println!("No recorded runs.");
            }
            for run in runs.iter().take(*limit) {
                println!("{}", format_run_row(run));
            }
        }
        RunsCommand::Show { id, output_format } => {
            let run = store.get_run(*id).await?.ok_or_else(|| {
                AppError::validation(ValidationError::UnknownRun { id: id.to_string() })
            })?;
            match output_format {
                OutputFormat::Text => print!("{}", format_run_text(&run)),
                OutputFormat::Json => println!("{}", format_run_json(&run)?),
            }
        }
    }
    Ok(())
}

pub(crate) fn config_from_args(ctx: &AppContext, args: ConfigSaveArgs) -> LoadTestConfig {
    LoadTestConfig {
        name: args.name,
        request_file: args.request_file.to_string_lossy().into_owned(),
        concurrency: args.concurrency,
        total_requests: args.requests,
        ramp_up_secs: args.ramp_up.map_or(0, whole_seconds),
        duration_secs: args.duration.map_or(0, whole_seconds),
        profile: args
            .profile
            .unwrap_or_else(|| ctx.default_profile().to_owned()),
    }
}
