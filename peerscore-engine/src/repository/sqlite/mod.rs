//! SQLite implementation of `ProjectRepository`.
//!
//! Each project is stored as one JSON snapshot row next to its version and
//! state. Published events go to an append-only `project_events` table.
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table that tracks the schema version.
//! When the schema needs to change, increment `CURRENT_SCHEMA_VERSION` and add
//! a migration in `run_migrations()`. Migrations run sequentially from the
//! current version to the target version.
//!
//! New fields on `Project` must carry `#[serde(default)]` so older snapshots
//! still deserialize.

mod events;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use peerscore_core::ProjectId;

use super::{check_version, ProjectRepository, RepositoryError};
use crate::project::Project;

/// Current schema version.
const CURRENT_SCHEMA_VERSION: i64 = 2;

/// SQLite-backed project repository.
///
/// Uses `tokio::task::spawn_blocking` to run synchronous rusqlite operations
/// without blocking the async runtime.
pub struct SqliteRepository {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path` and bring its schema up to
    /// date.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy();
        let is_in_memory = path_str == ":memory:";

        if !is_in_memory {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RepositoryError::storage(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| RepositoryError::storage("open database", e.to_string()))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| RepositoryError::storage("set journal_mode", e.to_string()))?;
        let journal_mode_ok = journal_mode.eq_ignore_ascii_case("wal")
            || (is_in_memory && journal_mode.eq_ignore_ascii_case("memory"));
        if !journal_mode_ok {
            warn!(
                "SQLite kept journal_mode '{}' instead of WAL for {}",
                journal_mode, path_str
            );
        }

        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("configure database", e.to_string()))?;

        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new in-memory SQLite repository (for testing).
    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        Self::new(":memory:")
    }

    /// Run migrations from `from_version` to `CURRENT_SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), RepositoryError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::storage(
                "schema version",
                format!(
                    "database schema version {} is newer than supported version {}",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        // Version 1: project snapshots
        if from_version < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    version INTEGER NOT NULL,
                    state TEXT NOT NULL,
                    snapshot_json TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_projects_state ON projects(state);
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v1", e.to_string()))?;
        }

        // Version 2: published event log
        if from_version < 2 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS project_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id TEXT NOT NULL,
                    event_type TEXT NOT NULL,
                    event_data TEXT NOT NULL,
                    occurred_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_project_events_lookup
                    ON project_events(project_id, id);
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v2", e.to_string()))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| RepositoryError::storage("update schema version", e.to_string()))?;

        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn, operation)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| RepositoryError::storage(operation, e.to_string()))?
    }
}

fn lock<'a>(
    conn: &'a Mutex<Connection>,
    operation: &'static str,
) -> Result<MutexGuard<'a, Connection>, RepositoryError> {
    conn.lock()
        .map_err(|_| RepositoryError::storage(operation, "connection mutex poisoned"))
}

/// Convert a project version to i64 for SQLite storage.
fn version_to_i64(version: u64) -> Result<i64, RepositoryError> {
    i64::try_from(version).map_err(|_| {
        RepositoryError::storage(
            "persist",
            format!("version {} exceeds maximum storable value", version),
        )
    })
}

/// Convert a stored i64 back to a project version.
fn i64_to_version(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| RepositoryError::corruption("project version"))
}

#[async_trait]
impl ProjectRepository for SqliteRepository {
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let key = id.to_string();
        self.with_conn("find_by_id", move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT snapshot_json FROM projects WHERE id = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| RepositoryError::storage("find_by_id", e.to_string()))?;

            json.map(|json| {
                serde_json::from_str::<Project>(&json)
                    .map_err(|_| RepositoryError::corruption("project snapshot"))
            })
            .transpose()
        })
        .await
    }

    async fn persist(&self, project: &Project) -> Result<(), RepositoryError> {
        let project_id = project.id();
        let key = project_id.to_string();
        let incoming = project.version();
        let incoming_i64 = version_to_i64(incoming)?;
        let state = project.state().to_string();
        let snapshot = serde_json::to_string(project)
            .map_err(|e| RepositoryError::storage("serialize project", e.to_string()))?;
        let updated_at = Utc::now().to_rfc3339();

        self.with_conn("persist", move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::storage("persist", e.to_string()))?;

            let stored: Option<i64> = tx
                .query_row(
                    "SELECT version FROM projects WHERE id = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| RepositoryError::storage("persist", e.to_string()))?;
            let stored = stored.map(i64_to_version).transpose()?;
            check_version(project_id, stored, incoming)?;

            tx.execute(
                "INSERT INTO projects (id, version, state, snapshot_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     version = excluded.version,
                     state = excluded.state,
                     snapshot_json = excluded.snapshot_json,
                     updated_at = excluded.updated_at",
                params![key, incoming_i64, state, snapshot, updated_at],
            )
            .map_err(|e| RepositoryError::storage("persist", e.to_string()))?;

            tx.commit()
                .map_err(|e| RepositoryError::storage("persist", e.to_string()))
        })
        .await
    }
}
