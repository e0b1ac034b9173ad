//! Error types shared by the scoring core.

use std::fmt;

/// A value object was constructed from an out-of-range or malformed input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed {kind} id: {value:?}")]
    MalformedId { kind: &'static str, value: String },

    #[error("{kind} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        kind: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{kind} must be a finite number")]
    NotFinite { kind: &'static str },

    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} exceeds {max} characters ({len})")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("invalid review topic input: {reason}")]
    InvalidInput { reason: String },
}

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Role,
    ReviewTopic,
    Milestone,
    PeerReview,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Role => write!(f, "role"),
            Self::ReviewTopic => write!(f, "review topic"),
            Self::Milestone => write!(f, "milestone"),
            Self::PeerReview => write!(f, "peer review"),
        }
    }
}

/// A referenced entity does not belong to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} {id} not found")]
pub struct NotFoundError {
    pub kind: EntityKind,
    pub id: String,
}

impl NotFoundError {
    pub fn new(kind: EntityKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

/// A computer was handed a matrix it cannot work with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputeError {
    #[error("{computer} needs at least {min} roles, got {actual}")]
    TooFewRoles {
        computer: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("score matrix row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("score matrix entry ({row}, {col}) is not a finite non-negative number")]
    InvalidEntry { row: usize, col: usize },

    #[error("missing peer review from {sender} to {receiver}")]
    MissingReview { sender: String, receiver: String },

    #[error("{computer} produced a non-finite result")]
    NonFinite { computer: &'static str },
}
