//! Commands that drive project transitions.
//!
//! Commands are requests from the outside world. Every id a command needs is
//! carried in the command itself so the transition function stays pure.

use peerscore_core::{
    Description, MilestoneId, PeerReviewId, PeerReviewScore, ReviewTopicId, ReviewTopicInput,
    RoleId, Title, UserIdentity,
};

use crate::project::ProjectSettings;

/// A peer review as submitted by a client, before it is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerReviewDraft {
    pub id: PeerReviewId,
    pub sender_role_id: RoleId,
    pub receiver_role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub milestone_id: MilestoneId,
    pub score: PeerReviewScore,
}

/// All commands a project accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // =========================================================================
    // Formation
    // =========================================================================
    UpdateDetails {
        title: Title,
        description: Description,
    },
    UpdateSettings {
        settings: ProjectSettings,
    },
    AddRole {
        role_id: RoleId,
        title: Title,
        description: Description,
    },
    UpdateRole {
        role_id: RoleId,
        title: Title,
        description: Description,
    },
    RemoveRole {
        role_id: RoleId,
    },
    AssignUser {
        role_id: RoleId,
        user: UserIdentity,
    },
    UnassignUser {
        role_id: RoleId,
    },
    AddReviewTopic {
        review_topic_id: ReviewTopicId,
        title: Title,
        description: Description,
        input: ReviewTopicInput,
    },
    UpdateReviewTopic {
        review_topic_id: ReviewTopicId,
        title: Title,
        description: Description,
        input: ReviewTopicInput,
    },
    RemoveReviewTopic {
        review_topic_id: ReviewTopicId,
    },
    FinishFormation,

    // =========================================================================
    // Active
    // =========================================================================
    AddMilestone {
        milestone_id: MilestoneId,
        title: Title,
        description: Description,
    },
    SubmitPeerReviews {
        peer_reviews: Vec<PeerReviewDraft>,
    },
    /// Fill in reviews for everyone who has not submitted yet.
    CompletePeerReviews,
    SubmitManagerReview,
    CancelMilestone,
    Archive,

    // =========================================================================
    // Any non-terminal state
    // =========================================================================
    Cancel,
}

impl Command {
    /// Stable operation name used in errors and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::UpdateDetails { .. } => "update_details",
            Self::UpdateSettings { .. } => "update_settings",
            Self::AddRole { .. } => "add_role",
            Self::UpdateRole { .. } => "update_role",
            Self::RemoveRole { .. } => "remove_role",
            Self::AssignUser { .. } => "assign_user",
            Self::UnassignUser { .. } => "unassign_user",
            Self::AddReviewTopic { .. } => "add_review_topic",
            Self::UpdateReviewTopic { .. } => "update_review_topic",
            Self::RemoveReviewTopic { .. } => "remove_review_topic",
            Self::FinishFormation => "finish_formation",
            Self::AddMilestone { .. } => "add_milestone",
            Self::SubmitPeerReviews { .. } => "submit_peer_reviews",
            Self::CompletePeerReviews => "complete_peer_reviews",
            Self::SubmitManagerReview => "submit_manager_review",
            Self::CancelMilestone => "cancel_milestone",
            Self::Archive => "archive",
            Self::Cancel => "cancel",
        }
    }

    /// Returns a summary of the command suitable for logging.
    ///
    /// Scores and emails are left out.
    pub fn log_summary(&self) -> String {
        match self {
            Self::AddRole { role_id, .. }
            | Self::UpdateRole { role_id, .. }
            | Self::RemoveRole { role_id }
            | Self::AssignUser { role_id, .. }
            | Self::UnassignUser { role_id } => {
                format!("{} {{ role: {} }}", self.operation(), role_id)
            }
            Self::AddReviewTopic {
                review_topic_id, ..
            }
            | Self::UpdateReviewTopic {
                review_topic_id, ..
            }
            | Self::RemoveReviewTopic { review_topic_id } => {
                format!(
                    "{} {{ review_topic: {} }}",
                    self.operation(),
                    review_topic_id
                )
            }
            Self::AddMilestone { milestone_id, .. } => {
                format!("add_milestone {{ milestone: {} }}", milestone_id)
            }
            Self::SubmitPeerReviews { peer_reviews } => {
                format!("submit_peer_reviews {{ count: {} }}", peer_reviews.len())
            }
            _ => self.operation().to_string(),
        }
    }
}
