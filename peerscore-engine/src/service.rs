//! Application service around the project state machine.
//!
//! Every write goes through the same loop:
//! 1. Load the project
//! 2. Run the pure transition
//! 3. Persist the new project (one version ahead)
//! 4. Publish the raised events in order
//!
//! Writers are serialized per project; a project's lock lives only while a
//! call holds or waits on it. The repository's version check catches writers
//! in other processes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use peerscore_core::{Contribution, MilestoneId, PeerReview, ProjectId, UserId};

use crate::error::{DomainError, ServiceError};
use crate::policy::ScoringPolicy;
use crate::project::{Project, ProjectDraft};
use crate::publisher::EventPublisher;
use crate::repository::ProjectRepository;
use crate::state_machine::{transition, Command, TransitionResult};
use crate::visibility;

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    publisher: Arc<dyn EventPublisher>,
    policy: ScoringPolicy,
    locks: Mutex<HashMap<ProjectId, Arc<Mutex<()>>>>,
}

impl ProjectService {
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        publisher: Arc<dyn EventPublisher>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            repository,
            publisher,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    async fn lock_for(&self, id: ProjectId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Hands back a lock taken with `lock_for`, dropping the map entry once
    /// no other writer holds it.
    async fn release(&self, id: ProjectId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(&id)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(&id);
        }
    }

    /// Creates a project in formation.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project, ServiceError> {
        let id = draft.id;
        let lock = self.lock_for(id).await;
        let result = {
            let _guard = lock.lock().await;
            self.create_locked(draft).await
        };
        self.release(id, lock).await;
        result
    }

    async fn create_locked(&self, draft: ProjectDraft) -> Result<Project, ServiceError> {
        let TransitionResult {
            mut project,
            events,
        } = Project::create(draft);
        project.bump_version();
        self.commit(&project, &events).await?;

        info!(project = %project.id(), "Created project {}", project.title());
        Ok(project)
    }

    /// Applies one command to a stored project.
    pub async fn execute(
        &self,
        project_id: ProjectId,
        command: Command,
    ) -> Result<TransitionResult, ServiceError> {
        let lock = self.lock_for(project_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.execute_locked(project_id, command).await
        };
        self.release(project_id, lock).await;
        result
    }

    async fn execute_locked(
        &self,
        project_id: ProjectId,
        command: Command,
    ) -> Result<TransitionResult, ServiceError> {
        let project = self
            .repository
            .find_by_id(&project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;
        let from = project.state();
        let summary = command.log_summary();

        let TransitionResult {
            mut project,
            events,
        } = match transition(project, command, &self.policy) {
            Ok(result) => result,
            Err(e) => {
                if e.is_invariant_violation() {
                    error!(project = %project_id, "Command {} hit invariant violation: {}", summary, e);
                } else {
                    warn!(project = %project_id, "Rejected command {}: {}", summary, e);
                }
                return Err(e.into());
            }
        };

        project.bump_version();
        self.commit(&project, &events).await?;

        info!(
            project = %project_id,
            version = project.version(),
            "Applied {}: {} -> {}, {} event(s)",
            summary,
            from,
            project.state(),
            events.len()
        );
        Ok(TransitionResult::new(project, events))
    }

    async fn commit(
        &self,
        project: &Project,
        events: &[crate::state_machine::DomainEvent],
    ) -> Result<(), ServiceError> {
        if let Err(e) = self.repository.persist(project).await {
            error!(project = %project.id(), "Failed to persist project: {}", e);
            return Err(e.into());
        }
        if let Err(e) = self.publisher.publish(&project.id(), events).await {
            error!(project = %project.id(), "Project persisted but events not published: {}", e);
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn find(&self, project_id: ProjectId) -> Result<Project, ServiceError> {
        self.repository
            .find_by_id(&project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))
    }

    /// Contributions of a milestone as `viewer` may see them.
    pub async fn contributions_for(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
        viewer: UserId,
    ) -> Result<Vec<Contribution>, ServiceError> {
        let project = self.find(project_id).await?;
        let visible = visibility::visible_contributions(&project, &milestone_id, &viewer)
            .map_err(DomainError::from)?;
        Ok(visible.into_iter().cloned().collect())
    }

    /// Peer reviews of a milestone as `viewer` may see them.
    pub async fn peer_reviews_for(
        &self,
        project_id: ProjectId,
        milestone_id: MilestoneId,
        viewer: UserId,
    ) -> Result<Vec<PeerReview>, ServiceError> {
        let project = self.find(project_id).await?;
        let visible = visibility::visible_peer_reviews(&project, &milestone_id, &viewer)
            .map_err(DomainError::from)?;
        Ok(visible.into_iter().cloned().collect())
    }
}
