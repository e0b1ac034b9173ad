//! Event log operations for the SQLite repository.
//!
//! Events are stored in the `project_events` table with JSON-encoded event
//! data. Row ids preserve publication order.

use chrono::{DateTime, Utc};
use rusqlite::params;

use peerscore_core::ProjectId;

use super::super::RepositoryError;
use super::SqliteRepository;
use crate::publisher::PublishedEvent;
use crate::state_machine::DomainEvent;

impl SqliteRepository {
    /// Appends events in one transaction.
    pub async fn append_events(&self, events: &[PublishedEvent]) -> Result<(), RepositoryError> {
        let rows = events
            .iter()
            .map(|published| -> Result<_, RepositoryError> {
                let data = serde_json::to_string(&published.event).map_err(|e| {
                    RepositoryError::storage("append_events serialize", e.to_string())
                })?;
                Ok((
                    published.project_id.to_string(),
                    published.event.name(),
                    data,
                    published.occurred_at.to_rfc3339(),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.with_conn("append_events", move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::storage("append_events", e.to_string()))?;
            for (project_id, event_type, data, occurred_at) in &rows {
                tx.execute(
                    "INSERT INTO project_events (project_id, event_type, event_data, occurred_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![project_id, event_type, data, occurred_at],
                )
                .map_err(|e| RepositoryError::storage("append_events", e.to_string()))?;
            }
            tx.commit()
                .map_err(|e| RepositoryError::storage("append_events", e.to_string()))
        })
        .await
    }

    /// All events of one project, oldest first.
    pub async fn events_for(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<PublishedEvent>, RepositoryError> {
        let project_id = *project_id;
        let key = project_id.to_string();
        self.with_conn("events_for", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT event_data, occurred_at FROM project_events
                     WHERE project_id = ?1 ORDER BY id ASC",
                )
                .map_err(|e| RepositoryError::storage("events_for", e.to_string()))?;

            let rows = stmt
                .query_map(params![key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| RepositoryError::storage("events_for", e.to_string()))?;

            let mut events = Vec::new();
            for row in rows {
                let (data, occurred_at) =
                    row.map_err(|e| RepositoryError::storage("events_for", e.to_string()))?;
                let event: DomainEvent = serde_json::from_str(&data)
                    .map_err(|_| RepositoryError::corruption("event JSON"))?;
                let occurred_at = DateTime::parse_from_rfc3339(&occurred_at)
                    .map_err(|_| RepositoryError::corruption("event timestamp"))?
                    .with_timezone(&Utc);
                events.push(PublishedEvent {
                    project_id,
                    occurred_at,
                    event,
                });
            }
            Ok(events)
        })
        .await
    }
}
