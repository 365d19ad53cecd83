use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ValidationError};

pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 1000;

/// Reusable load-test definition.
///
/// The executor takes a copy when a run starts; edits made afterwards only
/// affect later runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTestConfig {
    pub name: String,
    pub request_file: String,
    pub concurrency: usize,
    pub total_requests: u64,
    /// Seconds to reach full concurrency; 0 starts every worker at once.
    #[serde(default)]
    pub ramp_up_secs: u64,
    /// Upper bound on run time in seconds; 0 means only the budget bounds it.
    #[serde(default)]
    pub duration_secs: u64,
    pub profile: String,
}

impl LoadTestConfig {
    /// Checks the bounds a run depends on.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first field that is out of range.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(ValidationError::EmptyConfigName));
        }
        if self.request_file.trim().is_empty() {
            return Err(AppError::validation(ValidationError::EmptyRequestFile {
                name: self.name.clone(),
            }));
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(AppError::validation(
                ValidationError::ConcurrencyOutOfRange {
                    value: self.concurrency,
                    min: MIN_CONCURRENCY,
                    max: MAX_CONCURRENCY,
                },
            ));
        }
        if self.total_requests == 0 {
            return Err(AppError::validation(ValidationError::TotalRequestsZero));
        }
        if self.profile.trim().is_empty() {
            return Err(AppError::validation(ValidationError::EmptyProfile));
        }
        Ok(())
    }

    #[must_use]
    pub const fn ramp_up(&self) -> Duration {
        Duration::from_secs(self.ramp_up_secs)
    }

    /// Maximum run time, `None` when unbounded.
    #[must_use]
    pub const fn max_duration(&self) -> Option<Duration> {
        if self.duration_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.duration_secs))
        }
    }
}
