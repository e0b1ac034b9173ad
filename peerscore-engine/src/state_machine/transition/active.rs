//! Active state transitions.

use peerscore_core::ValidationError;

use super::{cancel_project, milestone, TransitionResult};
use crate::error::{ConflictError, DomainError};
use crate::policy::ScoringPolicy;
use crate::project::{Milestone, Project};
use crate::state_machine::command::Command;
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::ProjectState;

/// Handle commands while the project runs review rounds.
///
/// Milestone commands are delegated to the current milestone's state.
pub fn handle(
    mut project: Project,
    command: Command,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    match command {
        Command::UpdateDetails { title, description } => {
            project.title = title;
            project.description = description;
            Ok(TransitionResult::no_events(project))
        }

        Command::AddMilestone {
            milestone_id,
            title,
            description,
        } => {
            if let Some(pending) = project.pending_milestone() {
                return Err(ConflictError::MilestonePending {
                    milestone: pending.id,
                }
                .into());
            }
            if project.milestone(&milestone_id).is_some() {
                return Err(ValidationError::InvalidInput {
                    reason: format!("milestone id {} is already in use", milestone_id),
                }
                .into());
            }
            let milestone = Milestone::new(milestone_id, project.id(), title, description);
            project.milestones.push(milestone);
            Ok(TransitionResult::new(
                project,
                vec![
                    DomainEvent::MilestoneCreated { milestone_id },
                    DomainEvent::PeerReviewStarted { milestone_id },
                ],
            ))
        }

        command @ (Command::SubmitPeerReviews { .. }
        | Command::CompletePeerReviews
        | Command::SubmitManagerReview
        | Command::CancelMilestone) => milestone::handle(project, command, policy),

        Command::Archive => {
            if let Some(pending) = project.pending_milestone() {
                return Err(ConflictError::MilestonePending {
                    milestone: pending.id,
                }
                .into());
            }
            project.state = ProjectState::Archived;
            let project_id = project.id();
            Ok(TransitionResult::new(
                project,
                vec![DomainEvent::ProjectArchived { project_id }],
            ))
        }

        Command::Cancel => cancel_project(project),

        other => Err(DomainError::unsupported(other.operation(), project.state())),
    }
}

#[cfg(test)]
mod tests {
    use peerscore_core::{Description, MilestoneId, RoleId};

    use super::super::fixtures::*;
    use super::*;
    use crate::error::PreconditionError;
    use crate::state_machine::MilestoneState;

    fn policy() -> ScoringPolicy {
        ScoringPolicy::default()
    }

    #[test]
    fn test_add_milestone_starts_peer_review() {
        let project = active_project(4, 1);
        let milestone_id = MilestoneId::new();
        let result = handle(
            project,
            Command::AddMilestone {
                milestone_id,
                title: title("Sprint 1"),
                description: Description::empty(),
            },
            &policy(),
        )
        .unwrap();

        assert_eq!(
            result.project.milestone(&milestone_id).unwrap().state,
            MilestoneState::PeerReview
        );
        assert_eq!(
            result.events,
            vec![
                DomainEvent::MilestoneCreated { milestone_id },
                DomainEvent::PeerReviewStarted { milestone_id },
            ]
        );
    }

    #[test]
    fn test_one_open_milestone_at_a_time() {
        let (project, open) = with_milestone(active_project(4, 1));
        let err = handle(
            project,
            Command::AddMilestone {
                milestone_id: MilestoneId::new(),
                title: title("Sprint 2"),
                description: Description::empty(),
            },
            &policy(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::Conflict(ConflictError::MilestonePending { milestone: open })
        );
    }

    #[test]
    fn test_next_milestone_after_finish() {
        let (project, first) = with_milestone(active_project(4, 1));
        let project = submit_all_uniform(project, first);
        let project = run(project, Command::SubmitManagerReview).project;
        let (project, second) = with_milestone(project);

        assert_eq!(project.milestones().len(), 2);
        assert_eq!(project.pending_milestone().unwrap().id, second);
    }

    #[test]
    fn test_archive_requires_no_pending_milestone() {
        let (project, open) = with_milestone(active_project(4, 1));
        let err = handle(project.clone(), Command::Archive, &policy()).unwrap_err();
        assert_eq!(
            err,
            DomainError::Conflict(ConflictError::MilestonePending { milestone: open })
        );

        let project = run(project, Command::CancelMilestone).project;
        let project_id = project.id();
        let result = handle(project, Command::Archive, &policy()).unwrap();
        assert_eq!(result.project.state(), ProjectState::Archived);
        assert_eq!(
            result.events,
            vec![DomainEvent::ProjectArchived { project_id }]
        );
    }

    #[test]
    fn test_milestone_commands_need_a_milestone() {
        let err = handle(active_project(4, 1), Command::SubmitManagerReview, &policy()).unwrap_err();
        assert_eq!(err, DomainError::Precondition(PreconditionError::NoMilestone));
    }

    #[test]
    fn test_formation_commands_unsupported() {
        let err = handle(
            active_project(4, 1),
            Command::RemoveRole {
                role_id: RoleId::new(),
            },
            &policy(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::unsupported("remove_role", "active"));

        let err = handle(active_project(4, 1), Command::FinishFormation, &policy()).unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedOperation { .. }));
    }
}
