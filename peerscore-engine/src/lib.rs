//! Project lifecycle engine.
//!
//! The `Project` aggregate and its pure state machine live here, together
//! with the adapters that run it: repositories, event publishers, the
//! `ProjectService` and configuration.

pub mod config;
pub mod error;
pub mod policy;
pub mod project;
pub mod publisher;
pub mod repository;
pub mod service;
pub mod state_machine;
pub mod visibility;

pub use config::Config;
pub use error::{ConflictError, DomainError, PreconditionError, ServiceError};
pub use policy::ScoringPolicy;
pub use project::{
    ContributionVisibility, Milestone, Project, ProjectDraft, ProjectSettings, ReviewTopic, Role,
    SkipManagerReview,
};
pub use publisher::{EventPublisher, PublishError, PublishedEvent, RecordingPublisher, TracingPublisher};
pub use repository::{InMemoryRepository, ProjectRepository, RepositoryError, SqliteRepository};
pub use service::ProjectService;
pub use state_machine::{
    transition, Command, DomainEvent, MilestoneState, PeerReviewDraft, ProjectState,
    TransitionResult,
};
