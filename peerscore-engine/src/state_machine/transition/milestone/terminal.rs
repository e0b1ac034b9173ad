//! Terminal milestone states (Finished, Cancelled).

use super::TransitionResult;
use crate::error::DomainError;
use crate::state_machine::command::Command;
use crate::state_machine::state::MilestoneState;

pub(super) fn handle(
    state: MilestoneState,
    command: Command,
) -> Result<TransitionResult, DomainError> {
    Err(DomainError::unsupported(command.operation(), state))
}
