//! Error taxonomy for the engine.

use peerscore_core::{
    ComputeError, MilestoneId, NotFoundError, ReviewTopicId, RoleId, UserId, ValidationError,
};

use crate::publisher::PublishError;
use crate::repository::RepositoryError;

/// Two requests want the same slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("peer review from {sender} to {receiver} for review topic {review_topic} already submitted")]
    PeerReviewAlreadySubmitted {
        sender: RoleId,
        receiver: RoleId,
        review_topic: ReviewTopicId,
    },

    #[error("role {role} is already assigned")]
    RoleAlreadyAssigned { role: RoleId },

    #[error("user {user} already holds role {role}")]
    UserAlreadyAssigned { user: UserId, role: RoleId },

    #[error("milestone {milestone} is still open")]
    MilestonePending { milestone: MilestoneId },
}

/// The aggregate is in the right state but not ready for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("{count} role(s) have no assignee")]
    UnassignedRoles { count: usize },

    #[error("a project needs at least {min} roles, has {actual}")]
    TooFewRoles { min: usize, actual: usize },

    #[error("a project needs at least one review topic")]
    NoReviewTopics,

    #[error("project has no milestone")]
    NoMilestone,

    #[error("peer reviews target milestone {actual}, current milestone is {expected}")]
    WrongMilestone {
        expected: MilestoneId,
        actual: MilestoneId,
    },

    #[error("role {role} cannot review itself")]
    SelfReview { role: RoleId },

    #[error("submission from {sender} for review topic {review_topic} must rate every other role with scores summing to [{min}, {max}]")]
    IncompleteSubmission {
        sender: RoleId,
        review_topic: ReviewTopicId,
        min: String,
        max: String,
    },

    #[error("no peer reviews submitted")]
    EmptySubmission,

    #[error("score {score} is not an accepted answer for review topic {review_topic}")]
    ScoreNotAdmitted {
        review_topic: ReviewTopicId,
        score: String,
    },
}

/// Failure of a state machine operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("operation {operation} not supported by current state ({state})")]
    UnsupportedOperation {
        operation: &'static str,
        state: String,
    },

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("scoring failed: {0}")]
    Compute(#[from] ComputeError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl DomainError {
    pub fn unsupported(operation: &'static str, state: impl ToString) -> Self {
        Self::UnsupportedOperation {
            operation,
            state: state.to_string(),
        }
    }

    /// Returns true for failures that indicate a bug in the engine rather
    /// than a bad request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::Compute(_))
    }
}

/// Failure of a service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("project {0} not found")]
    ProjectNotFound(peerscore_core::ProjectId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        assert!(DomainError::Invariant("x".into()).is_invariant_violation());
        assert!(DomainError::Compute(ComputeError::TooFewRoles {
            computer: "contributions",
            min: 4,
            actual: 3
        })
        .is_invariant_violation());
        assert!(!DomainError::unsupported("archive", "formation").is_invariant_violation());
        assert!(!DomainError::from(PreconditionError::NoMilestone).is_invariant_violation());
    }

    #[test]
    fn test_unsupported_message() {
        let err = DomainError::unsupported("submit_manager_review", "peer review");
        assert_eq!(
            err.to_string(),
            "operation submit_manager_review not supported by current state (peer review)"
        );
    }
}
