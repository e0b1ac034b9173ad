//! In-memory index over peer reviews.
//!
//! `PeerReviewCollection` answers the two questions the milestone state
//! machine keeps asking: "which reviews match this filter?" and "has every
//! required (review topic, sender, receiver) combination been submitted?".

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, NotFoundError, ValidationError};
use crate::ids::{MilestoneId, ReviewTopicId, RoleId};
use crate::review::{PeerReview, PeerReviewKey};

/// Absolute slack applied to both bounds of the score-sum band.
const SUM_EPSILON: f64 = 1e-9;

/// The set of roles and review topics a completeness check runs against.
///
/// Implemented by the project aggregate; kept as a trait so the collection
/// does not depend on it.
pub trait ReviewScope {
    /// Role ids in stable order.
    fn role_ids(&self) -> Vec<RoleId>;

    /// Review topic ids in stable order.
    fn review_topic_ids(&self) -> Vec<ReviewTopicId>;

    fn has_role(&self, id: &RoleId) -> bool {
        self.role_ids().contains(id)
    }

    fn has_review_topic(&self, id: &ReviewTopicId) -> bool {
        self.review_topic_ids().contains(id)
    }
}

/// Accepted band for the sum of one sender's scores for one review topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletenessPolicy {
    pub min_score_sum: f64,
    pub max_score_sum: f64,
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        Self {
            min_score_sum: 0.95,
            max_score_sum: 1.0,
        }
    }
}

impl CompletenessPolicy {
    pub fn new(min_score_sum: f64, max_score_sum: f64) -> Result<Self, ValidationError> {
        if !min_score_sum.is_finite() || !max_score_sum.is_finite() {
            return Err(ValidationError::NotFinite {
                kind: "score sum bound",
            });
        }
        if min_score_sum <= 0.0 || min_score_sum > max_score_sum {
            return Err(ValidationError::OutOfRange {
                kind: "minimum score sum",
                value: min_score_sum,
                min: f64::MIN_POSITIVE,
                max: max_score_sum,
            });
        }
        Ok(Self {
            min_score_sum,
            max_score_sum,
        })
    }

    pub fn accepts(&self, sum: f64) -> bool {
        sum >= self.min_score_sum - SUM_EPSILON && sum <= self.max_score_sum + SUM_EPSILON
    }

    /// Moves `sum` to the nearest point of the band.
    pub fn clamp_sum(&self, sum: f64) -> f64 {
        sum.clamp(self.min_score_sum, self.max_score_sum)
    }
}

/// Ordered collection of peer reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerReviewCollection {
    reviews: Vec<PeerReview>,
}

impl PeerReviewCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerReview> {
        self.reviews.iter()
    }

    pub fn as_slice(&self) -> &[PeerReview] {
        &self.reviews
    }

    /// Appends a review. Uniqueness of the review key is the caller's
    /// responsibility; see [`PeerReviewCollection::contains_key`].
    pub fn push(&mut self, review: PeerReview) {
        self.reviews.push(review);
    }

    pub fn contains_key(&self, key: &PeerReviewKey) -> bool {
        self.reviews.iter().any(|r| r.key() == *key)
    }

    /// Whether a review for this (sender, receiver, topic, milestone) exists.
    pub fn contains(
        &self,
        sender: &RoleId,
        receiver: &RoleId,
        topic: &ReviewTopicId,
        milestone: &MilestoneId,
    ) -> bool {
        self.contains_key(&PeerReviewKey {
            sender_role_id: *sender,
            receiver_role_id: *receiver,
            review_topic_id: *topic,
            milestone_id: *milestone,
        })
    }

    fn filtered(&self, predicate: impl Fn(&PeerReview) -> bool) -> Self {
        Self {
            reviews: self
                .reviews
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }

    pub fn where_sender_role(&self, role_id: &RoleId) -> Self {
        self.filtered(|r| r.sender_role_id == *role_id)
    }

    pub fn where_receiver_role(&self, role_id: &RoleId) -> Self {
        self.filtered(|r| r.receiver_role_id == *role_id)
    }

    pub fn where_review_topic(&self, topic_id: &ReviewTopicId) -> Self {
        self.filtered(|r| r.review_topic_id == *topic_id)
    }

    pub fn where_milestone(&self, milestone_id: &MilestoneId) -> Self {
        self.filtered(|r| r.milestone_id == *milestone_id)
    }

    pub fn sum_scores(&self) -> f64 {
        self.reviews.iter().map(|r| r.score.value()).sum()
    }

    /// Mean score over the collection, `None` when empty.
    pub fn mean_score(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            None
        } else {
            Some(self.sum_scores() / self.reviews.len() as f64)
        }
    }

    /// Returns whether `sender` has reviewed every other role of `scope` for
    /// `topic`, with scores summing into the policy band.
    ///
    /// The collection is expected to already be scoped to one milestone.
    /// A sender or topic that is not part of `scope` is reported through
    /// `not_found` rather than as `false`.
    pub fn are_complete_for_sender_role_and_review_topic<S, E>(
        &self,
        scope: &S,
        sender: &RoleId,
        topic: &ReviewTopicId,
        policy: &CompletenessPolicy,
        not_found: impl Fn(NotFoundError) -> E,
    ) -> Result<bool, E>
    where
        S: ReviewScope + ?Sized,
    {
        let roles = scope.role_ids();
        if !roles.contains(sender) {
            return Err(not_found(NotFoundError::new(EntityKind::Role, sender)));
        }
        if !scope.has_review_topic(topic) {
            return Err(not_found(NotFoundError::new(
                EntityKind::ReviewTopic,
                topic,
            )));
        }

        let sent = self.where_sender_role(sender).where_review_topic(topic);
        let receivers: HashSet<RoleId> = sent.iter().map(|r| r.receiver_role_id).collect();
        let covers_everyone = roles
            .iter()
            .filter(|role| *role != sender)
            .all(|role| receivers.contains(role));

        Ok(covers_everyone && policy.accepts(sent.sum_scores()))
    }

    /// Returns whether every (review topic, sender) pair of `scope` is
    /// complete.
    pub fn are_complete<S>(&self, scope: &S, policy: &CompletenessPolicy) -> bool
    where
        S: ReviewScope + ?Sized,
    {
        self.incomplete_pairs(scope, policy).is_empty()
    }

    /// Lists the (review topic, sender) pairs that are not yet complete, in
    /// scope order.
    pub fn incomplete_pairs<S>(
        &self,
        scope: &S,
        policy: &CompletenessPolicy,
    ) -> Vec<(ReviewTopicId, RoleId)>
    where
        S: ReviewScope + ?Sized,
    {
        let mut missing = Vec::new();
        for topic in scope.review_topic_ids() {
            for sender in scope.role_ids() {
                // Both ids come from the scope itself, so the lookup cannot fail.
                let complete = self
                    .are_complete_for_sender_role_and_review_topic(
                        scope,
                        &sender,
                        &topic,
                        policy,
                        |_| (),
                    )
                    .unwrap_or(false);
                if !complete {
                    missing.push((topic, sender));
                }
            }
        }
        missing
    }
}

impl FromIterator<PeerReview> for PeerReviewCollection {
    fn from_iter<T: IntoIterator<Item = PeerReview>>(iter: T) -> Self {
        Self {
            reviews: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<PeerReview>> for PeerReviewCollection {
    fn from(reviews: Vec<PeerReview>) -> Self {
        Self { reviews }
    }
}

impl<'a> IntoIterator for &'a PeerReviewCollection {
    type Item = &'a PeerReview;
    type IntoIter = std::slice::Iter<'a, PeerReview>;

    fn into_iter(self) -> Self::IntoIter {
        self.reviews.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ids::PeerReviewId;
    use crate::review::PeerReviewFlag;
    use crate::values::PeerReviewScore;
    use proptest::prelude::*;

    pub(crate) struct FixedScope {
        pub roles: Vec<RoleId>,
        pub topics: Vec<ReviewTopicId>,
    }

    impl ReviewScope for FixedScope {
        fn role_ids(&self) -> Vec<RoleId> {
            self.roles.clone()
        }

        fn review_topic_ids(&self) -> Vec<ReviewTopicId> {
            self.topics.clone()
        }
    }

    fn scope(n: usize) -> FixedScope {
        FixedScope {
            roles: (0..n).map(|_| RoleId::new()).collect(),
            topics: vec![ReviewTopicId::new()],
        }
    }

    fn review(
        sender: RoleId,
        receiver: RoleId,
        topic: ReviewTopicId,
        milestone: MilestoneId,
        score: f64,
    ) -> PeerReview {
        PeerReview {
            id: PeerReviewId::new(),
            sender_role_id: sender,
            receiver_role_id: receiver,
            review_topic_id: topic,
            milestone_id: milestone,
            score: PeerReviewScore::new(score).unwrap(),
            flag: PeerReviewFlag::None,
        }
    }

    fn uniform_row(
        scope: &FixedScope,
        sender: usize,
        milestone: MilestoneId,
    ) -> Vec<PeerReview> {
        let n = scope.roles.len();
        scope
            .roles
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != sender)
            .map(|(_, receiver)| {
                review(
                    scope.roles[sender],
                    *receiver,
                    scope.topics[0],
                    milestone,
                    1.0 / (n - 1) as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_filters_are_pure() {
        let s = scope(4);
        let m = MilestoneId::new();
        let all: PeerReviewCollection = uniform_row(&s, 0, m).into();

        let to_first = all.where_receiver_role(&s.roles[1]);
        assert_eq!(to_first.len(), 1);
        assert_eq!(all.len(), 3);
        assert_eq!(all.where_sender_role(&s.roles[1]).len(), 0);
        assert_eq!(all.where_review_topic(&s.topics[0]).len(), 3);
        assert_eq!(all.where_milestone(&MilestoneId::new()).len(), 0);

        assert!(all.contains(&s.roles[0], &s.roles[1], &s.topics[0], &m));
        assert!(!all.contains(&s.roles[1], &s.roles[0], &s.topics[0], &m));
    }

    #[test]
    fn test_sum_and_mean() {
        let s = scope(4);
        let all: PeerReviewCollection = uniform_row(&s, 0, MilestoneId::new()).into();
        assert!((all.sum_scores() - 1.0).abs() < 1e-12);
        assert!((all.mean_score().unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(PeerReviewCollection::new().mean_score(), None);
    }

    #[test]
    fn test_sender_complete_requires_every_receiver() {
        let s = scope(4);
        let m = MilestoneId::new();
        let mut reviews = uniform_row(&s, 0, m);
        let last = reviews.pop().unwrap();
        let mut coll: PeerReviewCollection = reviews.into();

        let policy = CompletenessPolicy::default();
        let complete = coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &s.roles[0],
                &s.topics[0],
                &policy,
                |e| e,
            )
            .unwrap();
        assert!(!complete);

        coll.push(last);
        let complete = coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &s.roles[0],
                &s.topics[0],
                &policy,
                |e| e,
            )
            .unwrap();
        assert!(complete);
    }

    #[test]
    fn test_sender_complete_requires_sum_in_band() {
        let s = scope(4);
        let m = MilestoneId::new();
        let coll: PeerReviewCollection = (1..4)
            .map(|j| review(s.roles[0], s.roles[j], s.topics[0], m, 0.2))
            .collect();

        let complete = coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &s.roles[0],
                &s.topics[0],
                &CompletenessPolicy::default(),
                |e| e,
            )
            .unwrap();
        assert!(!complete);

        let lenient = CompletenessPolicy::new(0.5, 1.0).unwrap();
        assert!(coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &s.roles[0],
                &s.topics[0],
                &lenient,
                |e| e,
            )
            .unwrap());
    }

    #[test]
    fn test_unknown_sender_uses_caller_error() {
        let s = scope(4);
        let coll = PeerReviewCollection::new();
        let stranger = RoleId::new();

        #[derive(Debug, PartialEq)]
        struct Wrapped(EntityKind);

        let err = coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &stranger,
                &s.topics[0],
                &CompletenessPolicy::default(),
                |e| Wrapped(e.kind),
            )
            .unwrap_err();
        assert_eq!(err, Wrapped(EntityKind::Role));

        let err = coll
            .are_complete_for_sender_role_and_review_topic(
                &s,
                &s.roles[0],
                &ReviewTopicId::new(),
                &CompletenessPolicy::default(),
                |e| Wrapped(e.kind),
            )
            .unwrap_err();
        assert_eq!(err, Wrapped(EntityKind::ReviewTopic));
    }

    #[test]
    fn test_complete_only_when_every_sender_done() {
        let s = scope(4);
        let m = MilestoneId::new();
        let policy = CompletenessPolicy::default();
        let mut coll = PeerReviewCollection::new();

        for sender in 0..3 {
            for r in uniform_row(&s, sender, m) {
                coll.push(r);
            }
        }
        assert!(!coll.are_complete(&s, &policy));
        assert_eq!(
            coll.incomplete_pairs(&s, &policy),
            vec![(s.topics[0], s.roles[3])]
        );

        for r in uniform_row(&s, 3, m) {
            coll.push(r);
        }
        assert!(coll.are_complete(&s, &policy));
    }

    #[test]
    fn test_policy_rejects_bad_bounds() {
        assert!(CompletenessPolicy::new(0.0, 1.0).is_err());
        assert!(CompletenessPolicy::new(1.1, 1.0).is_err());
        assert!(CompletenessPolicy::new(f64::NAN, 1.0).is_err());
        assert!(CompletenessPolicy::default().accepts(1.0 + 1e-12));
        assert!(!CompletenessPolicy::default().accepts(0.9));
    }

    #[test]
    fn test_lower_bound_tolerates_rounding() {
        let policy = CompletenessPolicy::default();
        // Three absent scores at the mean of two rows summing to exactly 0.95.
        let mean = (0.77 + 0.11 + 0.07 + 0.15 + 0.39 + 0.41) / 6.0;
        assert!(policy.accepts(mean * 3.0));
        assert!(policy.accepts(0.95 - 1e-12));
        assert!(!policy.accepts(0.95 - 1e-6));

        assert_eq!(policy.clamp_sum(0.5), 0.95);
        assert_eq!(policy.clamp_sum(1.2), 1.0);
        assert_eq!(policy.clamp_sum(0.97), 0.97);
    }

    proptest! {
        /// Adding a review never turns a complete sender incomplete.
        #[test]
        fn test_completeness_is_monotonic(
            order in Just((0usize..3).collect::<Vec<_>>()).prop_shuffle(),
            extra_sender in 1usize..4,
        ) {
            let s = scope(4);
            let m = MilestoneId::new();
            let policy = CompletenessPolicy::default();
            let row = uniform_row(&s, 0, m);
            let mut coll = PeerReviewCollection::new();
            let mut was_complete = false;

            let check = |coll: &PeerReviewCollection| {
                coll.are_complete_for_sender_role_and_review_topic(
                    &s, &s.roles[0], &s.topics[0], &policy, |e| e,
                ).unwrap()
            };

            for idx in order {
                coll.push(row[idx].clone());
                let now = check(&coll);
                prop_assert!(!was_complete || now);
                was_complete = now;
            }
            prop_assert!(was_complete);

            // Reviews from other senders leave this sender untouched.
            for r in uniform_row(&s, extra_sender, m) {
                coll.push(r);
                prop_assert!(check(&coll));
            }
        }
    }
}
