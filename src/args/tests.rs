use super::*;
use crate::args::parsers::parse_var;
use crate::domain::{RunId, TlsVersion};
use clap::{CommandFactory, Parser};
use std::time::Duration;

fn parse(args: &[&str]) -> Result<Cli, String> {
    Cli::try_parse_from(args).map_err(|err| err.to_string())
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn run_accepts_ad_hoc_options() -> Result<(), String> {
    let cli = parse(&[
        "volley",
        "--verbose",
        "run",
        "smoke",
        "--request-file",
        "req.toml",
        "-c",
        "25",
        "-n",
        "500",
        "--ramp-up",
        "1500ms",
        "--duration",
        "2m",
        "--var",
        "host=example.test",
        "--var",
        "query=a=b",
        "--grace",
        "3s",
        "--insecure",
        "--tls-min",
        "1.2",
        "--save",
        "--output-format",
        "json",
    ])?;
    if !cli.verbose {
        return Err("Global flag lost".to_owned());
    }
    let Command::Run(run) = cli.command else {
        return Err("Expected run command".to_owned());
    };
    if run.name.as_deref() != Some("smoke") || run.concurrency != Some(25) {
        return Err(format!("Unexpected run args: {:?}", run));
    }
    if run.requests != Some(500)
        || run.ramp_up != Some(Duration::from_millis(1_500))
        || run.duration != Some(Duration::from_secs(120))
        || run.grace != Some(Duration::from_secs(3))
    {
        return Err(format!("Unexpected numeric args: {:?}", run));
    }
    let expected_vars = vec![
        ("host".to_owned(), "example.test".to_owned()),
        ("query".to_owned(), "a=b".to_owned()),
    ];
    if run.vars != expected_vars {
        return Err(format!("Unexpected vars: {:?}", run.vars));
    }
    if !run.tls.insecure || run.tls.tls_min != Some(TlsVersion::V1_2) || !run.save {
        return Err(format!("Unexpected flags: {:?}", run));
    }
    if run.output_format != OutputFormat::Json {
        return Err("Expected JSON output".to_owned());
    }
    Ok(())
}

#[test]
fn run_rejects_bad_values() -> Result<(), String> {
    for args in [
        vec!["volley", "run", "--var", "novalue"],
        vec!["volley", "run", "--ramp-up", "soon"],
        vec!["volley", "run", "--tls-min", "2.0"],
        vec!["volley", "run", "-c", "-3"],
    ] {
        if Cli::try_parse_from(&args).is_ok() {
            return Err(format!("Expected parse failure for {:?}", args));
        }
    }
    Ok(())
}

#[test]
fn config_save_uses_defaults() -> Result<(), String> {
    let cli = parse(&["volley", "config", "save", "nightly", "-f", "req.json"])?;
    match cli.command {
        Command::Config(ConfigCommand::Save(save)) => {
            if save.concurrency != 10 || save.requests != 100 || save.profile.is_some() {
                return Err(format!("Unexpected defaults: {:?}", save));
            }
            Ok(())
        }
        other => Err(format!("Expected config save, got {:?}", other)),
    }
}

#[test]
fn runs_show_parses_run_id() -> Result<(), String> {
    let id = RunId::new();
    let text = id.to_string();
    let cli = parse(&["volley", "runs", "show", text.as_str()])?;
    match cli.command {
        Command::Runs(RunsCommand::Show { id: parsed, .. }) if parsed == id => {}
        other => return Err(format!("Unexpected command: {:?}", other)),
    }
    if parse(&["volley", "runs", "show", "12"]).is_ok() {
        return Err("Invalid run id should be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn runs_list_filters_by_profile() -> Result<(), String> {
    let cli = parse(&["volley", "--store", "/tmp/v.db", "runs", "list", "-p", "prod"])?;
    if cli.store.as_deref() != Some(std::path::Path::new("/tmp/v.db")) {
        return Err("Store path lost".to_owned());
    }
    match cli.command {
        Command::Runs(RunsCommand::List { profile, limit }) => {
            if profile.as_deref() != Some("prod") || limit != 20 {
                return Err(format!("Unexpected list args: {:?} {}", profile, limit));
            }
            Ok(())
        }
        other => Err(format!("Expected runs list, got {:?}", other)),
    }
}

#[test]
fn parse_var_requires_key() -> Result<(), String> {
    if parse_var("=value").is_ok() || parse_var("plain").is_ok() {
        return Err("Expected invalid variables to fail".to_owned());
    }
    let (key, value) = parse_var(" token =abc=").map_err(|err| err.to_string())?;
    if key != "token" || value != "abc=" {
        return Err(format!("Unexpected parse: {}={}", key, value));
    }
    Ok(())
}
