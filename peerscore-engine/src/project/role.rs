use serde::{Deserialize, Serialize};

use peerscore_core::{Description, ProjectId, RoleId, Title, UserIdentity};

/// One team seat. Holds at most one assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub project_id: ProjectId,
    pub assignee: Option<UserIdentity>,
    pub title: Title,
    pub description: Description,
}

impl Role {
    pub fn new(id: RoleId, project_id: ProjectId, title: Title, description: Description) -> Self {
        Self {
            id,
            project_id,
            assignee: None,
            title,
            description,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some()
    }

    pub fn is_held_by(&self, user: &peerscore_core::UserId) -> bool {
        self.assignee.as_ref().is_some_and(|a| a.id == *user)
    }
}
