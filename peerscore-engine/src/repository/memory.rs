//! In-memory implementation of `ProjectRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use peerscore_core::ProjectId;

use super::{check_version, ProjectRepository, RepositoryError};
use crate::project::Project;

/// In-memory project repository.
///
/// Stores projects in a `HashMap` protected by a `RwLock`.
/// All state is lost on restart.
pub struct InMemoryRepository {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored projects.
    pub async fn count(&self) -> usize {
        self.projects.read().await.len()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let projects = self.projects.read().await;
        Ok(projects.get(id).cloned())
    }

    async fn persist(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut projects = self.projects.write().await;
        let stored = projects.get(&project.id()).map(|p| p.version());
        check_version(project.id(), stored, project.version())?;
        projects.insert(project.id(), project.clone());
        Ok(())
    }
}
