//! ManagerReview state transitions.

use peerscore_core::MilestoneId;

use super::{cancel, TransitionResult};
use crate::error::DomainError;
use crate::project::Project;
use crate::state_machine::command::Command;
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::MilestoneState;

/// Handle commands while the round's results wait for the project manager.
pub(super) fn handle(
    mut project: Project,
    milestone_id: MilestoneId,
    command: Command,
) -> Result<TransitionResult, DomainError> {
    match command {
        Command::SubmitManagerReview => {
            project.milestone_mut(&milestone_id)?.state = MilestoneState::Finished;
            Ok(TransitionResult::new(
                project,
                vec![
                    DomainEvent::ManagerReviewFinished { milestone_id },
                    DomainEvent::MilestoneFinished { milestone_id },
                ],
            ))
        }

        Command::CancelMilestone => cancel(project, milestone_id),

        other => Err(DomainError::unsupported(
            other.operation(),
            MilestoneState::ManagerReview,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::transition::fixtures::*;

    fn in_manager_review() -> (Project, MilestoneId) {
        let (project, milestone_id) = with_milestone(active_project(4, 1));
        let project = submit_all_uniform(project, milestone_id);
        assert_eq!(
            project.milestone(&milestone_id).unwrap().state,
            MilestoneState::ManagerReview
        );
        (project, milestone_id)
    }

    #[test]
    fn test_manager_review_finishes_milestone() {
        let (project, milestone_id) = in_manager_review();
        let result = handle(project, milestone_id, Command::SubmitManagerReview).unwrap();

        assert_eq!(
            result.project.milestone(&milestone_id).unwrap().state,
            MilestoneState::Finished
        );
        assert_eq!(
            result.events,
            vec![
                DomainEvent::ManagerReviewFinished { milestone_id },
                DomainEvent::MilestoneFinished { milestone_id },
            ]
        );
    }

    #[test]
    fn test_cancel_during_manager_review() {
        let (project, milestone_id) = in_manager_review();
        let result = handle(project, milestone_id, Command::CancelMilestone).unwrap();
        assert_eq!(
            result.project.milestone(&milestone_id).unwrap().state,
            MilestoneState::Cancelled
        );
        // Computed contributions stay on record.
        assert_eq!(result.project.contributions().len(), 4);
    }

    #[test]
    fn test_peer_review_commands_rejected() {
        let (project, milestone_id) = in_manager_review();
        let err = handle(project, milestone_id, Command::CompletePeerReviews).unwrap_err();
        assert_eq!(
            err,
            DomainError::unsupported("complete_peer_reviews", "manager review")
        );
    }
}
