//! Peer review and contribution records.

use serde::{Deserialize, Serialize};

use crate::ids::{ContributionId, MilestoneId, PeerReviewId, ReviewTopicId, RoleId};
use crate::values::{ContributionAmount, PeerReviewScore};

/// Marks reviews the system filled in on behalf of a non-responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerReviewFlag {
    #[default]
    None,
    Absent,
}

/// One sender role's rating of one receiver role for one review topic.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReview {
    pub id: PeerReviewId,
    pub sender_role_id: RoleId,
    pub receiver_role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub milestone_id: MilestoneId,
    pub score: PeerReviewScore,
    #[serde(default)]
    pub flag: PeerReviewFlag,
}

impl PeerReview {
    pub fn is_absent(&self) -> bool {
        self.flag == PeerReviewFlag::Absent
    }

    /// The (sender, receiver, topic, milestone) tuple that must be unique.
    pub fn key(&self) -> PeerReviewKey {
        PeerReviewKey {
            sender_role_id: self.sender_role_id,
            receiver_role_id: self.receiver_role_id,
            review_topic_id: self.review_topic_id,
            milestone_id: self.milestone_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerReviewKey {
    pub sender_role_id: RoleId,
    pub receiver_role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub milestone_id: MilestoneId,
}

/// A role's computed share for a review topic in a milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub milestone_id: MilestoneId,
    pub amount: ContributionAmount,
}
