//! Pure state transition function.
//!
//! `transition` takes a project and a command and returns the new project
//! together with the events the change raised. It has no side effects; the
//! service persists the project and publishes the events.
//!
//! Each project state has its own handler module with co-located tests:
//! - `formation`: roles, review topics and assignments are being set up
//! - `active`: milestones run; milestone commands go to `milestone`
//! - `terminal`: Archived and Cancelled reject everything

mod active;
mod formation;
mod milestone;
mod terminal;

#[cfg(test)]
pub(crate) mod fixtures;

use tracing::debug;

use super::command::Command;
use super::event::DomainEvent;
use super::state::ProjectState;
use crate::error::DomainError;
use crate::policy::ScoringPolicy;
use crate::project::Project;

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    /// The project after the transition.
    pub project: Project,
    /// Events raised, in order.
    pub events: Vec<DomainEvent>,
}

impl TransitionResult {
    pub fn new(project: Project, events: Vec<DomainEvent>) -> Self {
        Self { project, events }
    }

    pub fn no_events(project: Project) -> Self {
        Self {
            project,
            events: vec![],
        }
    }
}

/// Pure state transition function.
///
/// On error the input project is dropped; callers that need it afterwards
/// keep their own copy.
pub fn transition(
    project: Project,
    command: Command,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    debug!(
        project = %project.id(),
        state = %project.state(),
        command = %command.log_summary(),
        "Applying command"
    );
    match project.state() {
        ProjectState::Formation => formation::handle(project, command),
        ProjectState::Active => active::handle(project, command, policy),
        ProjectState::Archived | ProjectState::Cancelled => terminal::handle(project, command),
    }
}

/// Cancels a project, cancelling its open milestone first.
pub(super) fn cancel_project(mut project: Project) -> Result<TransitionResult, DomainError> {
    let mut events = Vec::new();
    if let Some(pending) = project.pending_milestone().map(|m| m.id) {
        milestone::cancel_milestone(&mut project, &pending, &mut events)?;
    }
    project.state = ProjectState::Cancelled;
    events.push(DomainEvent::ProjectCancelled {
        project_id: project.id(),
    });
    Ok(TransitionResult::new(project, events))
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::state_machine::MilestoneState;

    #[test]
    fn test_cancel_from_formation() {
        let project = formation_project(4);
        let id = project.id();
        let result = run(project, Command::Cancel);
        assert_eq!(result.project.state(), ProjectState::Cancelled);
        assert_eq!(
            result.events,
            vec![DomainEvent::ProjectCancelled { project_id: id }]
        );
    }

    #[test]
    fn test_cancel_with_open_milestone_cancels_it_first() {
        let (project, milestone_id) = with_milestone(active_project(4, 1));
        let id = project.id();
        let result = run(project, Command::Cancel);

        assert_eq!(result.project.state(), ProjectState::Cancelled);
        assert_eq!(
            result.project.milestone(&milestone_id).unwrap().state,
            MilestoneState::Cancelled
        );
        assert_eq!(
            result.events,
            vec![
                DomainEvent::MilestoneCancelled { milestone_id },
                DomainEvent::ProjectCancelled { project_id: id },
            ]
        );
    }

    #[test]
    fn test_finished_milestone_is_left_alone_on_cancel() {
        let (project, milestone_id) = with_milestone(active_project(4, 1));
        let project = submit_all_uniform(project, milestone_id);
        let project = run(project, Command::SubmitManagerReview).project;

        let result = run(project, Command::Cancel);
        assert_eq!(
            result.project.milestone(&milestone_id).unwrap().state,
            MilestoneState::Finished
        );
        assert_eq!(result.events.len(), 1);
    }
}
