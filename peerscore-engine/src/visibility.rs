//! Read-side rules for who may see which results.
//!
//! Only two kinds of viewer exist: the project creator and role holders.
//! A user may be both, in which case they see the union.

use peerscore_core::{Contribution, EntityKind, MilestoneId, NotFoundError, PeerReview, UserId};

use crate::project::{ContributionVisibility, Project};
use crate::state_machine::{MilestoneState, ProjectState};

/// Contributions of one milestone that `viewer` may see.
pub fn visible_contributions<'a>(
    project: &'a Project,
    milestone_id: &MilestoneId,
    viewer: &UserId,
) -> Result<Vec<&'a Contribution>, NotFoundError> {
    let state = milestone_state(project, milestone_id)?;
    if project.state().is_smaller_than(ProjectState::Active) {
        return Ok(Vec::new());
    }

    let creator_sees = project.is_creator(viewer)
        && state.is_greater_equals(MilestoneState::ManagerReview);
    let own_role = project.role_of_user(viewer).map(|r| r.id);
    let member_sees_all = own_role.is_some()
        && state.is_greater_equals(MilestoneState::Finished)
        && project.settings().contribution_visibility == ContributionVisibility::Public;
    let member_sees_own = state.is_greater_equals(MilestoneState::Finished)
        && project.settings().contribution_visibility == ContributionVisibility::OwnOnly;

    Ok(project
        .contributions_for_milestone(milestone_id)
        .into_iter()
        .filter(|c| {
            creator_sees || member_sees_all || (member_sees_own && Some(c.role_id) == own_role)
        })
        .collect())
}

/// Peer reviews of one milestone that `viewer` may see.
///
/// Receivers never see individual reviews addressed to them.
pub fn visible_peer_reviews<'a>(
    project: &'a Project,
    milestone_id: &MilestoneId,
    viewer: &UserId,
) -> Result<Vec<&'a PeerReview>, NotFoundError> {
    let state = milestone_state(project, milestone_id)?;
    if project.state().is_smaller_than(ProjectState::Active) {
        return Ok(Vec::new());
    }

    let creator_sees = project.is_creator(viewer)
        && state.is_greater_equals(MilestoneState::ManagerReview);
    let own_role = project.role_of_user(viewer).map(|r| r.id);

    Ok(project
        .peer_reviews()
        .iter()
        .filter(|r| r.milestone_id == *milestone_id)
        .filter(|r| creator_sees || Some(r.sender_role_id) == own_role)
        .collect())
}

fn milestone_state(
    project: &Project,
    milestone_id: &MilestoneId,
) -> Result<MilestoneState, NotFoundError> {
    project
        .milestone(milestone_id)
        .map(|m| m.state)
        .ok_or_else(|| NotFoundError::new(EntityKind::Milestone, milestone_id))
}
