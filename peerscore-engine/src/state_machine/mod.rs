//! Explicit state machine for the project lifecycle.
//!
//! The design separates:
//! - **State**: where the project and its milestones are (`ProjectState`,
//!   `MilestoneState`)
//! - **Commands**: what a caller asks for (`Command`)
//! - **Events**: what happened (`DomainEvent`)
//! - **Transition**: pure function `(Project, Command) -> (Project, Vec<DomainEvent>)`
//!
//! The service persists the resulting project and publishes the events.

pub mod command;
pub mod event;
pub mod state;
pub mod transition;

pub use command::*;
pub use event::*;
pub use state::*;
pub use transition::*;
