use std::time::Duration;

use crate::config::parse_duration_value;
use crate::domain::{RunId, TlsVersion};
use crate::error::ValidationError;

/// Parses `key=value`; the value may itself contain `=`.
pub(crate) fn parse_var(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(ValidationError::InvalidVariable {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration_value(s).map_err(|err| err.to_string())
}

pub(super) fn parse_tls_version(s: &str) -> Result<TlsVersion, String> {
    s.parse::<TlsVersion>().map_err(|err| err.to_string())
}

pub(super) fn parse_run_id(s: &str) -> Result<RunId, String> {
    s.parse::<RunId>().map_err(|err| err.to_string())
}
