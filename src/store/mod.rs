//! Persistence for load-test configs and run records.
mod memory;
mod sqlite;


use async_trait::async_trait;

use crate::domain::{LoadTestConfig, Run, RunId};
use crate::error::AppResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Config and run persistence used by the executor and the CLI.
///
/// The executor calls [`RunStore::save_run`] exactly once per run, when it
/// finalizes.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Inserts or replaces the config with the same name.
    async fn save_config(&self, config: &LoadTestConfig) -> AppResult<()>;
    async fn list_configs(&self) -> AppResult<Vec<LoadTestConfig>>;
    async fn get_config(&self, name: &str) -> AppResult<Option<LoadTestConfig>>;
    /// Returns whether a config was removed.
    async fn delete_config(&self, name: &str) -> AppResult<bool>;
    async fn save_run(&self, run: &Run) -> AppResult<()>;
    /// Most recent first, optionally limited to one profile.
    async fn list_runs(&self, profile: Option<&str>) -> AppResult<Vec<Run>>;
    async fn get_run(&self, id: RunId) -> AppResult<Option<Run>>;
}
