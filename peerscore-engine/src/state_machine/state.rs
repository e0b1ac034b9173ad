//! Lifecycle states for projects and milestones.
//!
//! Both are flat enums; every transition lives in `transition/`. Ordinals
//! back the visibility rules and must not be reordered. `Cancelled` has the
//! lowest ordinal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a project as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    /// Roles, review topics and assignments are being set up.
    Formation,
    /// Review rounds (milestones) run.
    Active,
    /// Finished for good.
    Archived,
    /// Abandoned.
    Cancelled,
}

impl ProjectState {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Cancelled => 0,
            Self::Formation => 1,
            Self::Active => 2,
            Self::Archived => 3,
        }
    }

    pub fn is_greater_equals(&self, other: ProjectState) -> bool {
        self.ordinal() >= other.ordinal()
    }

    pub fn is_smaller_than(&self, other: ProjectState) -> bool {
        self.ordinal() < other.ordinal()
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived | Self::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formation => write!(f, "formation"),
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// State of a single review round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneState {
    /// Members are submitting peer reviews.
    PeerReview,
    /// Results are computed and wait for the project manager.
    ManagerReview,
    /// Round closed normally.
    Finished,
    /// Round abandoned.
    Cancelled,
}

impl MilestoneState {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Cancelled => 0,
            Self::PeerReview => 1,
            Self::ManagerReview => 2,
            Self::Finished => 3,
        }
    }

    pub fn is_greater_equals(&self, other: MilestoneState) -> bool {
        self.ordinal() >= other.ordinal()
    }

    pub fn is_smaller_than(&self, other: MilestoneState) -> bool {
        self.ordinal() < other.ordinal()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerReview => write!(f, "peer review"),
            Self::ManagerReview => write!(f, "manager review"),
            Self::Finished => write!(f, "finished"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_ordinals() {
        use ProjectState::*;
        assert!(Active.is_greater_equals(Formation));
        assert!(Archived.is_greater_equals(Active));
        assert!(Formation.is_smaller_than(Active));
        assert!(Cancelled.is_smaller_than(Formation));
        assert!(!Cancelled.is_greater_equals(Formation));
        assert!(Active.is_greater_equals(Active));
    }

    #[test]
    fn test_milestone_ordinals() {
        use MilestoneState::*;
        assert!(ManagerReview.is_greater_equals(PeerReview));
        assert!(Finished.is_greater_equals(ManagerReview));
        assert!(Cancelled.is_smaller_than(PeerReview));
    }

    #[test]
    fn test_terminal_states_are_not_cancellable() {
        assert!(ProjectState::Formation.is_cancellable());
        assert!(ProjectState::Active.is_cancellable());
        assert!(!ProjectState::Archived.is_cancellable());
        assert!(!ProjectState::Cancelled.is_cancellable());
        assert!(MilestoneState::PeerReview.is_cancellable());
        assert!(MilestoneState::ManagerReview.is_cancellable());
        assert!(!MilestoneState::Finished.is_cancellable());
        assert!(!MilestoneState::Cancelled.is_cancellable());
    }
}
