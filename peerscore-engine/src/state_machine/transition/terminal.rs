//! Terminal project states (Archived, Cancelled).

use super::TransitionResult;
use crate::error::DomainError;
use crate::project::Project;
use crate::state_machine::command::Command;

/// Archived and cancelled projects are read-only.
pub fn handle(project: Project, command: Command) -> Result<TransitionResult, DomainError> {
    Err(DomainError::unsupported(
        command.operation(),
        project.state(),
    ))
}
