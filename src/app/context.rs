use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::args::Cli;
use crate::config::{ProfileConfig, SettingsFile, load_settings};
use crate::engine::{DEFAULT_TICK_INTERVAL, ExecutorSettings};
use crate::error::{AppError, AppResult, ConfigError};
use crate::store::SqliteStore;

/// Profile used when neither the CLI nor the settings file names one. It may
/// be absent from the settings file.
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_STORE_PATH: &str = ".volley/volley.db";
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Settings shared by every subcommand.
#[derive(Debug, Default)]
pub struct AppContext {
    pub settings: SettingsFile,
    pub store_path: PathBuf,
}

impl AppContext {
    /// Loads the settings file and works out where the store lives.
    ///
    /// # Errors
    ///
    /// Returns an error when an explicit or default settings file cannot be
    /// read or parsed.
    pub fn load(cli: &Cli) -> AppResult<Self> {
        let settings = load_settings(cli.config.as_deref())?.unwrap_or_default();
        let settings_dir = cli
            .config
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        Ok(Self::from_settings(
            settings,
            settings_dir.as_deref(),
            cli.store.clone(),
        ))
    }

    /// `store_override` wins over `store_path` from the settings file, which
    /// resolves relative to `settings_dir`.
    #[must_use]
    pub fn from_settings(
        settings: SettingsFile,
        settings_dir: Option<&Path>,
        store_override: Option<PathBuf>,
    ) -> Self {
        let store_path = store_override
            .or_else(|| {
                settings.store_path.as_ref().map(|path| match settings_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                })
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        Self {
            settings,
            store_path,
        }
    }

    #[must_use]
    pub fn default_profile(&self) -> &str {
        self.settings
            .default_profile
            .as_deref()
            .unwrap_or(DEFAULT_PROFILE)
    }

    /// Looks up a profile. The built-in default profile resolves to an empty
    /// one when the settings file does not declare it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownProfile` for any other missing profile.
    pub fn profile(&self, name: &str) -> AppResult<ProfileConfig> {
        match self.settings.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == DEFAULT_PROFILE => {
                debug!("Profile '{}' not declared; using empty profile", name);
                Ok(ProfileConfig::default())
            }
            None => Err(AppError::config(ConfigError::UnknownProfile {
                name: name.to_owned(),
            })),
        }
    }

    /// # Errors
    ///
    /// Returns an error when `grace_period` in the settings file is malformed.
    pub fn grace_period(&self, cli_override: Option<Duration>) -> AppResult<Duration> {
        if let Some(grace) = cli_override {
            return Ok(grace);
        }
        self.settings
            .grace_period
            .as_ref()
            .map_or(Ok(DEFAULT_GRACE_PERIOD), |value| {
                value.to_duration().map_err(|err| {
                    AppError::config(ConfigError::InvalidDuration {
                        field: "grace_period",
                        message: err.to_string(),
                    })
                })
            })
    }

    #[must_use]
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            tick_interval: non_zero_millis(self.settings.tick_interval_ms)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
        }
    }

    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        non_zero_millis(self.settings.progress_interval_ms).unwrap_or(DEFAULT_PROGRESS_INTERVAL)
    }

    /// # Errors
    ///
    /// Returns an error when the SQLite store cannot be opened.
    pub async fn open_store(&self) -> AppResult<Arc<SqliteStore>> {
        debug!(path = %self.store_path.display(), "Opening store");
        Ok(Arc::new(SqliteStore::open(&self.store_path).await?))
    }
}

fn non_zero_millis(value: Option<u64>) -> Option<Duration> {
    value.filter(|ms| *ms > 0).map(Duration::from_millis)
}
