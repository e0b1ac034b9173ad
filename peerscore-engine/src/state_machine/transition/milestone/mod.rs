//! Milestone state transitions.
//!
//! Milestone commands always target the project's latest milestone. Each
//! milestone state has its own handler:
//! - `peer_review`: accepting reviews, filling in absentees
//! - `manager_review`: waiting for the project manager
//! - `terminal`: Finished and Cancelled reject everything
//!
//! `scoring` runs once the last review of a round arrives.

mod manager_review;
mod peer_review;
mod scoring;
mod terminal;

use peerscore_core::MilestoneId;

use super::TransitionResult;
use crate::error::{DomainError, PreconditionError};
use crate::policy::ScoringPolicy;
use crate::project::Project;
use crate::state_machine::command::Command;
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::MilestoneState;

pub(super) fn handle(
    project: Project,
    command: Command,
    policy: &ScoringPolicy,
) -> Result<TransitionResult, DomainError> {
    let current = project
        .current_milestone()
        .ok_or(PreconditionError::NoMilestone)?;
    let (milestone_id, state) = (current.id, current.state);

    match state {
        MilestoneState::PeerReview => peer_review::handle(project, milestone_id, command, policy),
        MilestoneState::ManagerReview => manager_review::handle(project, milestone_id, command),
        MilestoneState::Finished | MilestoneState::Cancelled => {
            terminal::handle(state, command)
        }
    }
}

/// Moves an open milestone to Cancelled.
pub(super) fn cancel_milestone(
    project: &mut Project,
    milestone_id: &MilestoneId,
    events: &mut Vec<DomainEvent>,
) -> Result<(), DomainError> {
    let milestone = project.milestone_mut(milestone_id)?;
    if !milestone.state.is_cancellable() {
        return Err(DomainError::unsupported("cancel_milestone", milestone.state));
    }
    milestone.state = MilestoneState::Cancelled;
    events.push(DomainEvent::MilestoneCancelled {
        milestone_id: *milestone_id,
    });
    Ok(())
}

/// Shared by both open milestone states.
fn cancel(mut project: Project, milestone_id: MilestoneId) -> Result<TransitionResult, DomainError> {
    let mut events = Vec::new();
    cancel_milestone(&mut project, &milestone_id, &mut events)?;
    Ok(TransitionResult::new(project, events))
}
