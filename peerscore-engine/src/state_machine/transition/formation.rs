//! Formation state transitions.

use peerscore_core::{ContributionsComputer, ValidationError};

use super::{cancel_project, TransitionResult};
use crate::error::{ConflictError, DomainError, PreconditionError};
use crate::project::{Project, ReviewTopic, Role};
use crate::state_machine::command::Command;
use crate::state_machine::event::DomainEvent;
use crate::state_machine::state::ProjectState;

/// Smallest team the contributions computer accepts.
pub(crate) const MIN_ROLES: usize = ContributionsComputer::MIN_ROLES;

/// Handle commands while the project is being set up.
///
/// Formation is the only state in which roles, review topics and
/// assignments may change.
pub fn handle(mut project: Project, command: Command) -> Result<TransitionResult, DomainError> {
    match command {
        Command::UpdateDetails { title, description } => {
            project.title = title;
            project.description = description;
            Ok(TransitionResult::no_events(project))
        }

        Command::UpdateSettings { settings } => {
            project.settings = settings;
            Ok(TransitionResult::no_events(project))
        }

        Command::AddRole {
            role_id,
            title,
            description,
        } => {
            if project.role(&role_id).is_some() {
                return Err(duplicate_id("role", role_id));
            }
            let role = Role::new(role_id, project.id(), title, description);
            project.roles.push(role);
            Ok(TransitionResult::no_events(project))
        }

        Command::UpdateRole {
            role_id,
            title,
            description,
        } => {
            let role = project.role_mut(&role_id)?;
            role.title = title;
            role.description = description;
            Ok(TransitionResult::no_events(project))
        }

        Command::RemoveRole { role_id } => {
            let removed = project.require_role(&role_id)?.clone();
            project.roles.retain(|r| r.id != role_id);
            let events = removed
                .assignee
                .map(|user| DomainEvent::UserUnassigned {
                    role_id,
                    user_id: user.id,
                })
                .into_iter()
                .collect();
            Ok(TransitionResult::new(project, events))
        }

        Command::AssignUser { role_id, user } => {
            if project.require_role(&role_id)?.is_assigned() {
                return Err(ConflictError::RoleAlreadyAssigned { role: role_id }.into());
            }
            if let Some(held) = project.role_of_user(&user.id) {
                return Err(ConflictError::UserAlreadyAssigned {
                    user: user.id,
                    role: held.id,
                }
                .into());
            }
            let user_id = user.id;
            project.role_mut(&role_id)?.assignee = Some(user);
            Ok(TransitionResult::new(
                project,
                vec![DomainEvent::UserAssigned { role_id, user_id }],
            ))
        }

        Command::UnassignUser { role_id } => {
            let previous = project.role_mut(&role_id)?.assignee.take();
            match previous {
                Some(user) => Ok(TransitionResult::new(
                    project,
                    vec![DomainEvent::UserUnassigned {
                        role_id,
                        user_id: user.id,
                    }],
                )),
                None => Err(ValidationError::InvalidInput {
                    reason: format!("role {} has no assignee", role_id),
                }
                .into()),
            }
        }

        Command::AddReviewTopic {
            review_topic_id,
            title,
            description,
            input,
        } => {
            if project.review_topic(&review_topic_id).is_some() {
                return Err(duplicate_id("review topic", review_topic_id));
            }
            input.validate()?;
            project.review_topics.push(ReviewTopic::new(
                review_topic_id,
                title,
                description,
                input,
            ));
            Ok(TransitionResult::no_events(project))
        }

        Command::UpdateReviewTopic {
            review_topic_id,
            title,
            description,
            input,
        } => {
            input.validate()?;
            let topic = project.review_topic_mut(&review_topic_id)?;
            topic.title = title;
            topic.description = description;
            topic.input = input;
            Ok(TransitionResult::no_events(project))
        }

        Command::RemoveReviewTopic { review_topic_id } => {
            project.require_review_topic(&review_topic_id)?;
            project.review_topics.retain(|t| t.id != review_topic_id);
            Ok(TransitionResult::no_events(project))
        }

        Command::FinishFormation => {
            let roles = project.roles().len();
            if roles < MIN_ROLES {
                return Err(PreconditionError::TooFewRoles {
                    min: MIN_ROLES,
                    actual: roles,
                }
                .into());
            }
            let unassigned = project.roles().iter().filter(|r| !r.is_assigned()).count();
            if unassigned > 0 {
                return Err(PreconditionError::UnassignedRoles { count: unassigned }.into());
            }
            if project.review_topics().is_empty() {
                return Err(PreconditionError::NoReviewTopics.into());
            }
            project.state = ProjectState::Active;
            let project_id = project.id();
            Ok(TransitionResult::new(
                project,
                vec![DomainEvent::ProjectFormationFinished { project_id }],
            ))
        }

        Command::Cancel => cancel_project(project),

        other => Err(DomainError::unsupported(other.operation(), project.state())),
    }
}

fn duplicate_id(kind: &str, id: impl std::fmt::Display) -> DomainError {
    ValidationError::InvalidInput {
        reason: format!("{} id {} is already in use", kind, id),
    }
    .into()
}
