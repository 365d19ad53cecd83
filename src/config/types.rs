use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::TlsPolicy;
use crate::error::AppResult;

/// Contents of `volley.toml` / `volley.json`.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    /// SQLite database holding configs and runs.
    pub store_path: Option<PathBuf>,
    pub tick_interval_ms: Option<u64>,
    pub progress_interval_ms: Option<u64>,
    pub grace_period: Option<DurationValue>,
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// Per-environment variables and TLS options.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(flatten)]
    pub tls: TlsPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// # Errors
    ///
    /// Returns a validation error when the text form does not parse.
    pub fn to_duration(&self) -> AppResult<Duration> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
