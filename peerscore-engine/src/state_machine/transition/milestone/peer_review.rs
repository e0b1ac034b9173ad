//! PeerReview state transitions.

use std::collections::HashSet;

use peerscore_core::{
    derive_uuid, MilestoneId, PeerReview, PeerReviewCollection, PeerReviewFlag, PeerReviewId,
    PeerReviewScore, ReviewScope, ReviewTopicId, RoleId,
};
use tracing::debug;

use super::{cancel, scoring, TransitionResult};
use crate::error::{ConflictError, DomainError, PreconditionError};
use crate::policy::ScoringPolicy;
use crate::project::Project;
use crate::state_machine::command::{Command, PeerReviewDraft};
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::MilestoneState;

/// Handle commands while members are submitting peer reviews.
pub(super) fn handle(
    project: Project,
    milestone_id: MilestoneId,
    command: Command,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    match command {
        Command::SubmitPeerReviews { peer_reviews } => submit(
            project,
            milestone_id,
            peer_reviews,
            PeerReviewFlag::None,
            policy,
        ),
        Command::CompletePeerReviews => complete(project, milestone_id, policy),
        Command::CancelMilestone => cancel(project, milestone_id),
        other => Err(DomainError::unsupported(
            other.operation(),
            MilestoneState::PeerReview,
        )),
    }
}

/// Accepts a batch of reviews and closes the round once it is complete.
///
/// The batch is all-or-nothing: any rejected draft rejects the whole batch.
fn submit(
    mut project: Project,
    milestone_id: MilestoneId,
    drafts: Vec<PeerReviewDraft>,
    flag: PeerReviewFlag,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    if drafts.is_empty() {
        return Err(PreconditionError::EmptySubmission.into());
    }

    let mut seen = HashSet::with_capacity(drafts.len());
    let mut groups: Vec<(RoleId, ReviewTopicId)> = Vec::new();
    let mut accepted = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let review = accept_draft(&project, milestone_id, draft, flag)?;
        let key = review.key();
        if project.peer_reviews.contains_key(&key) || !seen.insert(key) {
            return Err(ConflictError::PeerReviewAlreadySubmitted {
                sender: review.sender_role_id,
                receiver: review.receiver_role_id,
                review_topic: review.review_topic_id,
            }
            .into());
        }
        let group = (review.sender_role_id, review.review_topic_id);
        if !groups.contains(&group) {
            groups.push(group);
        }
        accepted.push(review);
    }

    // Each (sender, topic) group must be submitted whole.
    let batch: PeerReviewCollection = accepted.iter().cloned().collect();
    for (sender, review_topic) in groups {
        let whole = batch.are_complete_for_sender_role_and_review_topic(
            &project,
            &sender,
            &review_topic,
            &policy.completeness,
            DomainError::from,
        )?;
        if !whole {
            return Err(PreconditionError::IncompleteSubmission {
                sender,
                review_topic,
                min: policy.completeness.min_score_sum.to_string(),
                max: policy.completeness.max_score_sum.to_string(),
            }
            .into());
        }
    }

    let peer_review_ids = accepted.iter().map(|r| r.id).collect();
    for review in accepted {
        project.peer_reviews.push(review);
    }
    let mut events = vec![DomainEvent::PeerReviewsSubmitted {
        milestone_id,
        peer_review_ids,
    }];

    let round = project.peer_reviews.where_milestone(&milestone_id);
    if round.are_complete(&project, &policy.completeness) {
        scoring::finish_peer_review(&mut project, milestone_id, policy, &mut events)?;
    } else {
        debug!(
            milestone = %milestone_id,
            missing = round.incomplete_pairs(&project, &policy.completeness).len(),
            "Peer review round still open"
        );
    }

    Ok(TransitionResult::new(project, events))
}

fn accept_draft(
    project: &Project,
    milestone_id: MilestoneId,
    draft: PeerReviewDraft,
    flag: PeerReviewFlag,
) -> Result<PeerReview, DomainError> {
    if draft.milestone_id != milestone_id {
        return Err(PreconditionError::WrongMilestone {
            expected: milestone_id,
            actual: draft.milestone_id,
        }
        .into());
    }
    project.require_role(&draft.sender_role_id)?;
    project.require_role(&draft.receiver_role_id)?;
    let review_topic = project.require_review_topic(&draft.review_topic_id)?;
    if draft.sender_role_id == draft.receiver_role_id {
        return Err(PreconditionError::SelfReview {
            role: draft.sender_role_id,
        }
        .into());
    }
    // Absent scores are derived from the round, not picked from the input.
    if flag == PeerReviewFlag::None && !review_topic.input.admits(draft.score) {
        return Err(PreconditionError::ScoreNotAdmitted {
            review_topic: draft.review_topic_id,
            score: draft.score.value().to_string(),
        }
        .into());
    }
    Ok(PeerReview {
        id: draft.id,
        sender_role_id: draft.sender_role_id,
        receiver_role_id: draft.receiver_role_id,
        review_topic_id: draft.review_topic_id,
        milestone_id,
        score: draft.score,
        flag,
    })
}

/// Fills in reviews for every (topic, sender) pair that is still missing.
///
/// Each absentee rates every other role with the topic's mean score so far,
/// or an equal share when nobody has reviewed the topic yet. The score is
/// then pulled into the completeness band so the filled-in row always sums
/// into it.
fn complete(
    project: Project,
    milestone_id: MilestoneId,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    let round = project.peer_reviews.where_milestone(&milestone_id);
    let missing = round.incomplete_pairs(&project, &policy.completeness);
    if missing.is_empty() {
        return Err(DomainError::Invariant(format!(
            "milestone {} has every review but is still in peer review",
            milestone_id
        )));
    }

    let roles = project.role_ids();
    let receivers = roles.len().saturating_sub(1).max(1) as f64;
    let mut drafts = Vec::new();
    for (review_topic_id, sender) in missing {
        let mean = round
            .where_review_topic(&review_topic_id)
            .mean_score()
            .unwrap_or(1.0 / receivers);
        let row_sum = policy.completeness.clamp_sum(mean * receivers);
        let score = PeerReviewScore::clamped(row_sum / receivers)?;
        for receiver in roles.iter().filter(|r| **r != sender) {
            let id = derive_uuid(
                "absent-peer-review",
                &[
                    milestone_id.as_uuid(),
                    review_topic_id.as_uuid(),
                    sender.as_uuid(),
                    receiver.as_uuid(),
                ],
            );
            drafts.push(PeerReviewDraft {
                id: PeerReviewId::from(id),
                sender_role_id: sender,
                receiver_role_id: *receiver,
                review_topic_id,
                milestone_id,
                score,
            });
        }
    }

    debug!(
        milestone = %milestone_id,
        absent = drafts.len(),
        "Filling in absent peer reviews"
    );
    submit(project, milestone_id, drafts, PeerReviewFlag::Absent, policy)
}
