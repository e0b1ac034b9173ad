//! Scoring computers.
//!
//! Each computer is a pure function of a dense [`ScoreMatrix`]. The
//! [`compute_review_topic`] adapter maps one review topic's reviews onto a
//! matrix and the results back onto role ids.

mod cliquism;
mod consensuality;
mod contributions;

pub use cliquism::CliquismComputer;
pub use consensuality::{ConsensualityComputer, ConsensualityOutcome};
pub use contributions::{ContributionsComputer, SCORE_FLOOR};

use crate::collection::PeerReviewCollection;
use crate::error::ComputeError;
use crate::ids::RoleId;
use crate::matrix::ScoreMatrix;
use crate::values::{Agreement, Cliquism, Consensuality, ContributionAmount};

/// Everything derived from one review topic's completed reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTopicScores {
    pub contributions: Vec<(RoleId, ContributionAmount)>,
    pub consensuality: Consensuality,
    pub agreements: Vec<(RoleId, Agreement)>,
    pub cliquism: Cliquism,
}

/// Runs all three computers on one review topic.
///
/// `reviews` must hold exactly one topic's reviews for one milestone, and
/// every role in `roles` must have reviewed every other role.
pub fn compute_review_topic(
    roles: &[RoleId],
    reviews: &PeerReviewCollection,
) -> Result<ReviewTopicScores, ComputeError> {
    let matrix = ScoreMatrix::from_reviews(roles, reviews)?;

    let shares = ContributionsComputer::compute(&matrix)?;
    let ConsensualityOutcome {
        consensuality,
        agreements,
    } = ConsensualityComputer::compute(&matrix)?;
    let cliquism = CliquismComputer::compute(&matrix)?;

    let contributions = roles
        .iter()
        .zip(shares)
        .map(|(role, share)| {
            ContributionAmount::new(share)
                .map(|amount| (*role, amount))
                .map_err(|_| ComputeError::NonFinite {
                    computer: "contributions",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReviewTopicScores {
        contributions,
        consensuality,
        agreements: roles.iter().copied().zip(agreements).collect(),
        cliquism,
    })
}
