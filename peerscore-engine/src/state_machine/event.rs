//! Domain events raised by transitions.
//!
//! Events describe what happened. They are returned as data, in the order
//! the state machine produced them, and published by the caller after the
//! aggregate is persisted.

use serde::{Deserialize, Serialize};

use peerscore_core::{MilestoneId, PeerReviewId, ProjectId, RoleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    // =========================================================================
    // Project lifecycle
    // =========================================================================
    ProjectCreated {
        project_id: ProjectId,
        creator_id: UserId,
        title: String,
    },
    ProjectFormationStarted {
        project_id: ProjectId,
    },
    ProjectFormationFinished {
        project_id: ProjectId,
    },
    UserAssigned {
        role_id: RoleId,
        user_id: UserId,
    },
    UserUnassigned {
        role_id: RoleId,
        user_id: UserId,
    },
    ProjectArchived {
        project_id: ProjectId,
    },
    ProjectCancelled {
        project_id: ProjectId,
    },

    // =========================================================================
    // Milestone lifecycle
    // =========================================================================
    MilestoneCreated {
        milestone_id: MilestoneId,
    },
    PeerReviewStarted {
        milestone_id: MilestoneId,
    },
    PeerReviewsSubmitted {
        milestone_id: MilestoneId,
        peer_review_ids: Vec<PeerReviewId>,
    },
    /// The submission that made every review topic complete.
    FinalPeerReviewSubmitted {
        milestone_id: MilestoneId,
    },
    /// Contributions, consensuality and cliquism have been written.
    PeerReviewFinished {
        milestone_id: MilestoneId,
    },
    ManagerReviewStarted {
        milestone_id: MilestoneId,
    },
    ManagerReviewSkipped {
        milestone_id: MilestoneId,
    },
    ManagerReviewFinished {
        milestone_id: MilestoneId,
    },
    MilestoneFinished {
        milestone_id: MilestoneId,
    },
    MilestoneCancelled {
        milestone_id: MilestoneId,
    },
}

impl DomainEvent {
    /// Event name as used in logs and the event log table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProjectCreated { .. } => "project_created",
            Self::ProjectFormationStarted { .. } => "project_formation_started",
            Self::ProjectFormationFinished { .. } => "project_formation_finished",
            Self::UserAssigned { .. } => "user_assigned",
            Self::UserUnassigned { .. } => "user_unassigned",
            Self::ProjectArchived { .. } => "project_archived",
            Self::ProjectCancelled { .. } => "project_cancelled",
            Self::MilestoneCreated { .. } => "milestone_created",
            Self::PeerReviewStarted { .. } => "peer_review_started",
            Self::PeerReviewsSubmitted { .. } => "peer_reviews_submitted",
            Self::FinalPeerReviewSubmitted { .. } => "final_peer_review_submitted",
            Self::PeerReviewFinished { .. } => "peer_review_finished",
            Self::ManagerReviewStarted { .. } => "manager_review_started",
            Self::ManagerReviewSkipped { .. } => "manager_review_skipped",
            Self::ManagerReviewFinished { .. } => "manager_review_finished",
            Self::MilestoneFinished { .. } => "milestone_finished",
            Self::MilestoneCancelled { .. } => "milestone_cancelled",
        }
    }
}
