//! The project aggregate.
//!
//! A `Project` owns its roles, review topics, milestones, peer reviews and
//! contributions. Its fields are only reachable for writing from inside this
//! crate; outside code changes a project exclusively through
//! [`crate::state_machine::transition`].

mod milestone;
mod review_topic;
mod role;

pub use milestone::Milestone;
pub use review_topic::ReviewTopic;
pub use role::Role;

use serde::{Deserialize, Serialize};

use peerscore_core::{
    Contribution, Description, EntityKind, MilestoneId, NotFoundError, PeerReviewCollection,
    ProjectId, ReviewScope, ReviewTopicId, RoleId, Title, UserId,
};

use crate::error::DomainError;
use crate::state_machine::{DomainEvent, ProjectState, TransitionResult};

/// Whether a milestone waits for the project manager after peer review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipManagerReview {
    #[default]
    No,
    Yes,
    /// Skip only when every review topic came out consensual.
    IfConsensual,
}

/// Who may see computed contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionVisibility {
    /// Only the project creator.
    Hidden,
    /// Each role holder sees their own share.
    #[default]
    OwnOnly,
    /// Every role holder sees every share.
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub skip_manager_review: SkipManagerReview,
    pub contribution_visibility: ContributionVisibility,
}

/// Input to the project factory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub id: ProjectId,
    pub title: Title,
    pub description: Description,
    pub creator_id: UserId,
    pub settings: ProjectSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub(crate) id: ProjectId,
    pub(crate) title: Title,
    pub(crate) description: Description,
    pub(crate) creator_id: UserId,
    pub(crate) state: ProjectState,
    pub(crate) settings: ProjectSettings,
    pub(crate) roles: Vec<Role>,
    pub(crate) review_topics: Vec<ReviewTopic>,
    pub(crate) milestones: Vec<Milestone>,
    pub(crate) peer_reviews: PeerReviewCollection,
    pub(crate) contributions: Vec<Contribution>,
    /// Persistence version; bumped by the service on every stored change.
    #[serde(default)]
    pub(crate) version: u64,
}

impl Project {
    /// Creates a project in formation.
    pub fn create(draft: ProjectDraft) -> TransitionResult {
        let project = Self {
            id: draft.id,
            title: draft.title,
            description: draft.description,
            creator_id: draft.creator_id,
            state: ProjectState::Formation,
            settings: draft.settings,
            roles: Vec::new(),
            review_topics: Vec::new(),
            milestones: Vec::new(),
            peer_reviews: PeerReviewCollection::new(),
            contributions: Vec::new(),
            version: 0,
        };
        let events = vec![
            DomainEvent::ProjectCreated {
                project_id: project.id,
                creator_id: project.creator_id,
                title: project.title.to_string(),
            },
            DomainEvent::ProjectFormationStarted {
                project_id: project.id,
            },
        ];
        TransitionResult::new(project, events)
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn state(&self) -> ProjectState {
        self.state
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Marks the aggregate as one persisted change newer.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn review_topics(&self) -> &[ReviewTopic] {
        &self.review_topics
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn peer_reviews(&self) -> &PeerReviewCollection {
        &self.peer_reviews
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == *id)
    }

    pub fn review_topic(&self, id: &ReviewTopicId) -> Option<&ReviewTopic> {
        self.review_topics.iter().find(|t| t.id == *id)
    }

    pub fn milestone(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == *id)
    }

    /// The latest milestone, whatever its state.
    pub fn current_milestone(&self) -> Option<&Milestone> {
        self.milestones.last()
    }

    /// The milestone that is still open, if any.
    pub fn pending_milestone(&self) -> Option<&Milestone> {
        self.milestones.iter().find(|m| !m.is_terminal())
    }

    /// The role a user holds in this project.
    pub fn role_of_user(&self, user: &UserId) -> Option<&Role> {
        self.roles.iter().find(|r| r.is_held_by(user))
    }

    pub fn is_creator(&self, user: &UserId) -> bool {
        self.creator_id == *user
    }

    pub fn contributions_for_milestone(&self, milestone: &MilestoneId) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.milestone_id == *milestone)
            .collect()
    }

    pub(crate) fn require_role(&self, id: &RoleId) -> Result<&Role, DomainError> {
        self.role(id)
            .ok_or_else(|| NotFoundError::new(EntityKind::Role, id).into())
    }

    pub(crate) fn require_review_topic(
        &self,
        id: &ReviewTopicId,
    ) -> Result<&ReviewTopic, DomainError> {
        self.review_topic(id)
            .ok_or_else(|| NotFoundError::new(EntityKind::ReviewTopic, id).into())
    }

    pub(crate) fn role_mut(&mut self, id: &RoleId) -> Result<&mut Role, DomainError> {
        self.roles
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| NotFoundError::new(EntityKind::Role, id).into())
    }

    pub(crate) fn review_topic_mut(
        &mut self,
        id: &ReviewTopicId,
    ) -> Result<&mut ReviewTopic, DomainError> {
        self.review_topics
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| NotFoundError::new(EntityKind::ReviewTopic, id).into())
    }

    pub(crate) fn milestone_mut(&mut self, id: &MilestoneId) -> Result<&mut Milestone, DomainError> {
        self.milestones
            .iter_mut()
            .find(|m| m.id == *id)
            .ok_or_else(|| NotFoundError::new(EntityKind::Milestone, id).into())
    }
}

impl ReviewScope for Project {
    fn role_ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(|r| r.id).collect()
    }

    fn review_topic_ids(&self) -> Vec<ReviewTopicId> {
        self.review_topics.iter().map(|t| t.id).collect()
    }

    fn has_role(&self, id: &RoleId) -> bool {
        self.role(id).is_some()
    }

    fn has_review_topic(&self, id: &ReviewTopicId) -> bool {
        self.review_topic(id).is_some()
    }
}
