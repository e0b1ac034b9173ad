use serde::{Deserialize, Serialize};

use peerscore_core::{Description, MilestoneId, ProjectId, Title};

use crate::state_machine::MilestoneState;

/// One review round within an active project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    pub title: Title,
    pub description: Description,
    pub state: MilestoneState,
}

impl Milestone {
    /// A fresh milestone starts directly in peer review.
    pub fn new(
        id: MilestoneId,
        project_id: ProjectId,
        title: Title,
        description: Description,
    ) -> Self {
        Self {
            id,
            project_id,
            title,
            description,
            state: MilestoneState::PeerReview,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
