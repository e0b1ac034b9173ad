//! Repository abstraction for project persistence.
//!
//! The `ProjectRepository` trait stores whole `Project` aggregates.
//! Implementations provide the backend (in-memory, SQLite).

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;

use peerscore_core::ProjectId;

use crate::project::Project;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error during {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    #[error("corrupted {what} in storage")]
    Corruption { what: &'static str },

    #[error("project {project} was changed concurrently: stored version {stored}, incoming version {incoming}")]
    VersionConflict {
        project: ProjectId,
        stored: u64,
        incoming: u64,
    },
}

impl RepositoryError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }

    pub fn corruption(what: &'static str) -> Self {
        Self::Corruption { what }
    }
}

/// Repository trait for persisting projects.
///
/// `persist` is an upsert guarded by an optimistic version check: the
/// incoming project must be exactly one version ahead of what is stored
/// (a missing row counts as version 0).
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Get a project, returning None if not found.
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// Store a project.
    async fn persist(&self, project: &Project) -> Result<(), RepositoryError>;
}

/// Rejects `incoming` unless it directly follows `stored`.
pub(crate) fn check_version(
    project: ProjectId,
    stored: Option<u64>,
    incoming: u64,
) -> Result<(), RepositoryError> {
    let stored = stored.unwrap_or(0);
    if incoming != stored + 1 {
        return Err(RepositoryError::VersionConflict {
            project,
            stored,
            incoming,
        });
    }
    Ok(())
}
