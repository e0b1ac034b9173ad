//! Peer-review scoring core.
//!
//! Value objects, peer-review records, the completeness index over them, and
//! the computers that turn a complete round of reviews into contribution
//! shares, consensuality and cliquism. Everything here is synchronous and
//! side-effect free.

pub mod collection;
pub mod compute;
pub mod error;
pub mod ids;
pub mod matrix;
pub mod review;
pub mod values;

pub use collection::{CompletenessPolicy, PeerReviewCollection, ReviewScope};
pub use compute::{
    compute_review_topic, CliquismComputer, ConsensualityComputer, ConsensualityOutcome,
    ContributionsComputer, ReviewTopicScores,
};
pub use error::{ComputeError, EntityKind, NotFoundError, ValidationError};
pub use ids::{
    derive_uuid, ContributionId, MilestoneId, PeerReviewId, ProjectId, ReviewTopicId, RoleId,
    UserId,
};
pub use matrix::ScoreMatrix;
pub use review::{Contribution, PeerReview, PeerReviewFlag, PeerReviewKey};
pub use values::{
    Agreement, Cliquism, Consensuality, ContributionAmount, Description, DiscreteChoice, Email,
    PeerReviewScore, ReviewTopicInput, Title, UserIdentity,
};
