use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::domain::{LoadTestConfig, Run, RunId, RunStatus};
use crate::error::{AppError, AppResult, StoreError};
use crate::metrics::Stats;

use super::RunStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS load_configs (
        name TEXT PRIMARY KEY,
        request_file TEXT NOT NULL,
        concurrency INTEGER NOT NULL,
        total_requests INTEGER NOT NULL,
        ramp_up_secs INTEGER NOT NULL,
        duration_secs INTEGER NOT NULL,
        profile TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS load_runs (
        id TEXT PRIMARY KEY,
        config_name TEXT NOT NULL,
        profile TEXT NOT NULL,
        started_at TEXT NOT NULL,
        finished_at TEXT,
        status TEXT NOT NULL,
        stats_json TEXT NOT NULL,
        error TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_load_runs_profile ON load_runs(profile, started_at);";

const CONFIG_COLUMNS: &str =
    "name, request_file, concurrency, total_requests, ramp_up_secs, duration_secs, profile";
const RUN_COLUMNS: &str =
    "id, config_name, profile, started_at, finished_at, status, stats_json, error";

type ConfigRow = (String, String, i64, i64, i64, i64, String);
type RunRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
);

/// SQLite-backed store; all queries run on the tokio-rusqlite worker thread.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory, the database, or the schema
    /// cannot be created.
    pub async fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                AppError::store(StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source: err,
                })
            })?;
        }
        let conn = Connection::open(path).await.map_err(|err| {
            AppError::store(StoreError::Open {
                path: path.to_path_buf(),
                source: err,
            })
        })?;
        Self::initialize(conn).await
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database or schema cannot be created.
    pub async fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().await.map_err(|err| {
            AppError::store(StoreError::Open {
                path: ":memory:".into(),
                source: err,
            })
        })?;
        Self::initialize(conn).await
    }

    async fn initialize(conn: Connection) -> AppResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|err| query_error("initialize schema", err))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RunStore for SqliteStore {
    async fn save_config(&self, config: &LoadTestConfig) -> AppResult<()> {
        config.validate()?;
        let config = config.clone();
        let updated_at = format_timestamp(Utc::now());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO load_configs
                        (name, request_file, concurrency, total_requests, ramp_up_secs,
                         duration_secs, profile, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(name) DO UPDATE SET
                        request_file = excluded.request_file,
                        concurrency = excluded.concurrency,
                        total_requests = excluded.total_requests,
                        ramp_up_secs = excluded.ramp_up_secs,
                        duration_secs = excluded.duration_secs,
                        profile = excluded.profile,
                        updated_at = excluded.updated_at",
                    rusqlite::params![
                        config.name,
                        config.request_file,
                        clamp_i64(u64::try_from(config.concurrency).unwrap_or(u64::MAX)),
                        clamp_i64(config.total_requests),
                        clamp_i64(config.ramp_up_secs),
                        clamp_i64(config.duration_secs),
                        config.profile,
                        updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|err| query_error("save config", err))
    }

    async fn list_configs(&self) -> AppResult<Vec<LoadTestConfig>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM load_configs ORDER BY name",
                    CONFIG_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], read_config_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|err| query_error("list configs", err))?;
        rows.into_iter().map(config_from_row).collect()
    }

    async fn get_config(&self, name: &str) -> AppResult<Option<LoadTestConfig>> {
        let name = name.to_owned();
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!("SELECT {} FROM load_configs WHERE name = ?1", CONFIG_COLUMNS),
                        [name],
                        read_config_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|err| query_error("get config", err))?;
        row.map(config_from_row).transpose()
    }

    async fn delete_config(&self, name: &str) -> AppResult<bool> {
        let name = name.to_owned();
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute("DELETE FROM load_configs WHERE name = ?1", [name])?;
                Ok(removed)
            })
            .await
            .map_err(|err| query_error("delete config", err))?;
        Ok(removed > 0)
    }

    async fn save_run(&self, run: &Run) -> AppResult<()> {
        let stats_json = serde_json::to_string(&run.stats).map_err(|err| {
            AppError::store(StoreError::Encode {
                context: "run stats",
                source: err,
            })
        })?;
        let id = run.id.to_string();
        let config_name = run.config_name.clone();
        let profile = run.profile.clone();
        let started_at = format_timestamp(run.started_at);
        let finished_at = run.finished_at.map(format_timestamp);
        let status = run.status.as_str();
        let error = run.error.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO load_runs
                        (id, config_name, profile, started_at, finished_at, status, stats_json, error)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        id,
                        config_name,
                        profile,
                        started_at,
                        finished_at,
                        status,
                        stats_json,
                        error,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|err| query_error("save run", err))
    }

    async fn list_runs(&self, profile: Option<&str>) -> AppResult<Vec<Run>> {
        let profile = profile.map(str::to_owned);
        let rows = self
            .conn
            .call(move |conn| {
                let rows = if let Some(profile) = profile {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM load_runs WHERE profile = ?1 ORDER BY started_at DESC",
                        RUN_COLUMNS
                    ))?;
                    stmt.query_map([profile], read_run_row)?
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM load_runs ORDER BY started_at DESC",
                        RUN_COLUMNS
                    ))?;
                    stmt.query_map([], read_run_row)?
                        .collect::<Result<Vec<_>, _>>()?
                };
                Ok(rows)
            })
            .await
            .map_err(|err| query_error("list runs", err))?;
        rows.into_iter().map(run_from_row).collect()
    }

    async fn get_run(&self, id: RunId) -> AppResult<Option<Run>> {
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!("SELECT {} FROM load_runs WHERE id = ?1", RUN_COLUMNS),
                        [id],
                        read_run_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|err| query_error("get run", err))?;
        row.map(run_from_row).transpose()
    }
}

fn read_config_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConfigRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn read_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn config_from_row(row: ConfigRow) -> AppResult<LoadTestConfig> {
    let (name, request_file, concurrency, total_requests, ramp_up_secs, duration_secs, profile) =
        row;
    Ok(LoadTestConfig {
        concurrency: usize::try_from(concurrency)
            .map_err(|err| corrupt("config", format!("concurrency {}: {}", concurrency, err)))?,
        total_requests: non_negative("config", "total_requests", total_requests)?,
        ramp_up_secs: non_negative("config", "ramp_up_secs", ramp_up_secs)?,
        duration_secs: non_negative("config", "duration_secs", duration_secs)?,
        name,
        request_file,
        profile,
    })
}

fn run_from_row(row: RunRow) -> AppResult<Run> {
    let (id, config_name, profile, started_at, finished_at, status, stats_json, error) = row;
    let stats: Stats = serde_json::from_str(&stats_json)
        .map_err(|err| corrupt("run", format!("stats for {}: {}", id, err)))?;
    Ok(Run {
        id: id.parse()?,
        config_name,
        profile,
        started_at: parse_timestamp(&started_at)?,
        finished_at: finished_at.as_deref().map(parse_timestamp).transpose()?,
        status: RunStatus::parse(&status)
            .ok_or_else(|| corrupt("run", format!("unknown status '{}'", status)))?,
        stats,
        error,
    })
}

/// Fixed-width UTC timestamps, so `ORDER BY started_at` matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| corrupt("run", format!("timestamp '{}': {}", value, err)))
}

fn non_negative(context: &'static str, field: &str, value: i64) -> AppResult<u64> {
    u64::try_from(value).map_err(|err| corrupt(context, format!("{} {}: {}", field, value, err)))
}

fn corrupt(context: &'static str, message: String) -> AppError {
    AppError::store(StoreError::CorruptRow { context, message })
}

fn query_error(context: &'static str, source: tokio_rusqlite::Error) -> AppError {
    AppError::store(StoreError::Query { context, source })
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
