//! Event publication.
//!
//! Publishers receive the events of one persisted transition, in the order
//! the state machine raised them.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use peerscore_core::ProjectId;

use crate::repository::SqliteRepository;
use crate::state_machine::DomainEvent;

/// A domain event stamped with its project and publication time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub project_id: ProjectId,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl PublishedEvent {
    pub fn stamp(project_id: ProjectId, event: DomainEvent) -> Self {
        Self {
            project_id,
            occurred_at: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("event publication failed: {0}")]
pub struct PublishError(pub String);

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, project_id: &ProjectId, events: &[DomainEvent])
        -> Result<(), PublishError>;
}

/// Writes every event to the log.
#[derive(Debug, Default)]
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(
        &self,
        project_id: &ProjectId,
        events: &[DomainEvent],
    ) -> Result<(), PublishError> {
        for event in events {
            info!(project = %project_id, event = event.name(), "Domain event");
        }
        Ok(())
    }
}

/// Keeps every published event in memory. A poisoned lock is recovered,
/// not reported.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PublishedEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of everything published so far, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.published().iter().map(|p| p.event.name()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        project_id: &ProjectId,
        events: &[DomainEvent],
    ) -> Result<(), PublishError> {
        let mut recorded = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        recorded.extend(
            events
                .iter()
                .cloned()
                .map(|event| PublishedEvent::stamp(*project_id, event)),
        );
        Ok(())
    }
}

/// Appends events to the SQLite event log.
#[async_trait]
impl EventPublisher for SqliteRepository {
    async fn publish(
        &self,
        project_id: &ProjectId,
        events: &[DomainEvent],
    ) -> Result<(), PublishError> {
        let stamped: Vec<_> = events
            .iter()
            .cloned()
            .map(|event| PublishedEvent::stamp(*project_id, event))
            .collect();
        self.append_events(&stamped)
            .await
            .map_err(|e| PublishError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use peerscore_core::MilestoneId;

    use super::*;

    #[tokio::test]
    async fn test_recording_keeps_order() {
        let publisher = RecordingPublisher::new();
        let project_id = ProjectId::new();
        let milestone_id = MilestoneId::new();

        publisher
            .publish(
                &project_id,
                &[
                    DomainEvent::MilestoneCreated { milestone_id },
                    DomainEvent::PeerReviewStarted { milestone_id },
                ],
            )
            .await
            .unwrap();
        publisher
            .publish(&project_id, &[DomainEvent::MilestoneCancelled { milestone_id }])
            .await
            .unwrap();

        assert_eq!(
            publisher.names(),
            vec![
                "milestone_created",
                "peer_review_started",
                "milestone_cancelled"
            ]
        );
        assert!(publisher
            .published()
            .iter()
            .all(|p| p.project_id == project_id));
    }

    #[tokio::test]
    async fn test_recording_survives_poisoned_lock() {
        let publisher = std::sync::Arc::new(RecordingPublisher::new());
        let project_id = ProjectId::new();
        let milestone_id = MilestoneId::new();
        publisher
            .publish(&project_id, &[DomainEvent::MilestoneCreated { milestone_id }])
            .await
            .unwrap();

        let poisoner = publisher.clone();
        let panicked = std::thread::spawn(move || {
            let _held = poisoner.events.lock().unwrap();
            panic!("poison the recording lock");
        })
        .join();
        assert!(panicked.is_err());

        assert_eq!(publisher.names(), vec!["milestone_created"]);
        publisher
            .publish(&project_id, &[DomainEvent::MilestoneCancelled { milestone_id }])
            .await
            .unwrap();
        assert_eq!(
            publisher.names(),
            vec!["milestone_created", "milestone_cancelled"]
        );
    }

    #[tokio::test]
    async fn test_tracing_publisher_accepts_everything() {
        TracingPublisher
            .publish(
                &ProjectId::new(),
                &[DomainEvent::ProjectArchived {
                    project_id: ProjectId::new(),
                }],
            )
            .await
            .unwrap();
    }
}
