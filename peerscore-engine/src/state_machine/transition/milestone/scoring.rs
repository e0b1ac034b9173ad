//! Closing a complete peer review round.

use peerscore_core::{
    compute_review_topic, derive_uuid, Contribution, ContributionId, MilestoneId, ReviewScope,
};
use tracing::debug;

use crate::error::DomainError;
use crate::policy::ScoringPolicy;
use crate::project::{Project, SkipManagerReview};
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::MilestoneState;

/// Scores every review topic of the round and moves the milestone on.
///
/// Writes consensuality and cliquism onto each topic, appends one
/// contribution per role and topic, then either starts manager review or
/// finishes the milestone according to the project's skip policy.
pub(super) fn finish_peer_review(
    project: &mut Project,
    milestone_id: MilestoneId,
    policy: &ScoringPolicy,
    events: &mut Vec<DomainEvent>,
) -> Result<(), DomainError> {
    events.push(DomainEvent::FinalPeerReviewSubmitted { milestone_id });

    let roles = project.role_ids();
    let round = project.peer_reviews.where_milestone(&milestone_id);
    let mut all_consensual = true;

    for review_topic_id in project.review_topic_ids() {
        let scores = compute_review_topic(&roles, &round.where_review_topic(&review_topic_id))?;
        debug!(
            milestone = %milestone_id,
            review_topic = %review_topic_id,
            consensuality = %scores.consensuality,
            cliquism = %scores.cliquism,
            "Scored review topic"
        );
        all_consensual &= policy.is_consensual(scores.consensuality);

        let topic = project.review_topic_mut(&review_topic_id)?;
        topic.consensuality = Some(scores.consensuality);
        topic.cliquism = Some(scores.cliquism);

        for (role_id, amount) in scores.contributions {
            let id = derive_uuid(
                "contribution",
                &[
                    milestone_id.as_uuid(),
                    review_topic_id.as_uuid(),
                    role_id.as_uuid(),
                ],
            );
            project.contributions.push(Contribution {
                id: ContributionId::from(id),
                role_id,
                review_topic_id,
                milestone_id,
                amount,
            });
        }
    }
    events.push(DomainEvent::PeerReviewFinished { milestone_id });

    let skip = match project.settings.skip_manager_review {
        SkipManagerReview::No => false,
        SkipManagerReview::Yes => true,
        SkipManagerReview::IfConsensual => all_consensual,
    };

    let milestone = project.milestone_mut(&milestone_id)?;
    if skip {
        milestone.state = MilestoneState::Finished;
        events.push(DomainEvent::ManagerReviewSkipped { milestone_id });
        events.push(DomainEvent::MilestoneFinished { milestone_id });
    } else {
        milestone.state = MilestoneState::ManagerReview;
        events.push(DomainEvent::ManagerReviewStarted { milestone_id });
    }
    Ok(())
}
