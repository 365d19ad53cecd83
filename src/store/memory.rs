use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{LoadTestConfig, Run, RunId};
use crate::error::AppResult;

use super::RunStore;

/// Process-local store, for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    configs: Mutex<BTreeMap<String, LoadTestConfig>>,
    runs: Mutex<BTreeMap<RunId, Run>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn configs(&self) -> MutexGuard<'_, BTreeMap<String, LoadTestConfig>> {
        self.configs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn runs(&self) -> MutexGuard<'_, BTreeMap<RunId, Run>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn save_config(&self, config: &LoadTestConfig) -> AppResult<()> {
        config.validate()?;
        self.configs().insert(config.name.clone(), config.clone());
        Ok(())
    }

    async fn list_configs(&self) -> AppResult<Vec<LoadTestConfig>> {
        Ok(self.configs().values().cloned().collect())
    }

    async fn get_config(&self, name: &str) -> AppResult<Option<LoadTestConfig>> {
        Ok(self.configs().get(name).cloned())
    }

    async fn delete_config(&self, name: &str) -> AppResult<bool> {
        Ok(self.configs().remove(name).is_some())
    }

    async fn save_run(&self, run: &Run) -> AppResult<()> {
        self.runs().insert(run.id, run.clone());
        Ok(())
    }

    async fn list_runs(&self, profile: Option<&str>) -> AppResult<Vec<Run>> {
        let mut runs: Vec<Run> = self
            .runs()
            .values()
            .filter(|run| profile.is_none_or(|profile| run.profile == profile))
            .cloned()
            .collect();
        runs.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        Ok(runs)
    }

    async fn get_run(&self, id: RunId) -> AppResult<Option<Run>> {
        Ok(self.runs().get(&id).cloned())
    }
}
