//! Tests for the SQLite repository.

use rusqlite::params;

use peerscore_core::{MilestoneId, ProjectId};

use super::super::{ProjectRepository, RepositoryError};
use super::{SqliteRepository, CURRENT_SCHEMA_VERSION};
use crate::project::{Project, ProjectSettings};
use crate::publisher::{EventPublisher, PublishedEvent};
use crate::state_machine::transition::fixtures::*;
use crate::state_machine::{Command, DomainEvent};

fn versioned(mut project: Project) -> Project {
    project.bump_version();
    project
}

#[tokio::test]
async fn test_find_returns_none_for_missing() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let result = repo.find_by_id(&ProjectId::new()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_persist_then_find_full_aggregate() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let (project, milestone_id) = with_milestone(active_project(4, 2));
    let project = versioned(submit_all_uniform(project, milestone_id));

    repo.persist(&project).await.unwrap();
    let found = repo.find_by_id(&project.id()).await.unwrap().unwrap();

    assert_eq!(found, project);
    assert_eq!(found.contributions().len(), 8);
    assert!(found.review_topics()[0].consensuality.is_some());
}

#[tokio::test]
async fn test_version_conflict() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let project = versioned(new_project(ProjectSettings::default()));
    repo.persist(&project).await.unwrap();

    let stale = project.clone();
    let next = versioned(run(project, Command::Cancel).project);
    repo.persist(&next).await.unwrap();

    let err = repo.persist(&stale).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::VersionConflict {
            stored: 2,
            incoming: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_state_column_tracks_project() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let project = versioned(run(formation_project(4), Command::FinishFormation).project);
    repo.persist(&project).await.unwrap();

    let conn = repo.conn.lock().unwrap();
    let state: String = conn
        .query_row(
            "SELECT state FROM projects WHERE id = ?1",
            params![project.id().to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(state, "active");
}

#[tokio::test]
async fn test_corrupted_snapshot_reported() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let id = ProjectId::new();
    {
        let conn = repo.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO projects (id, version, state, snapshot_json, updated_at)
             VALUES (?1, 1, 'active', '{not json', '2024-01-01T00:00:00Z')",
            params![id.to_string()],
        )
        .unwrap();
    }

    let err = repo.find_by_id(&id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Corruption { .. }));
}

#[tokio::test]
async fn test_events_round_trip_in_order() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let project_id = ProjectId::new();
    let milestone_id = MilestoneId::new();
    let events = vec![
        DomainEvent::MilestoneCreated { milestone_id },
        DomainEvent::PeerReviewStarted { milestone_id },
        DomainEvent::MilestoneCancelled { milestone_id },
    ];

    repo.publish(&project_id, &events).await.unwrap();
    repo.publish(&ProjectId::new(), &events[..1]).await.unwrap();

    let stored: Vec<DomainEvent> = repo
        .events_for(&project_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p: PublishedEvent| p.event)
        .collect();
    assert_eq!(stored, events);
}

#[test]
fn test_schema_version_recorded() {
    let repo = SqliteRepository::new_in_memory().unwrap();
    let conn = repo.conn.lock().unwrap();
    let version: i64 = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_newer_schema_rejected() {
    let dir = std::env::temp_dir().join(format!("peerscore-schema-{}", ProjectId::new()));
    let path = dir.join("state.db");
    {
        let repo = SqliteRepository::new(&path).unwrap();
        let conn = repo.conn.lock().unwrap();
        conn.execute(
            "UPDATE schema_version SET version = ?1 WHERE id = 1",
            params![CURRENT_SCHEMA_VERSION + 1],
        )
        .unwrap();
    }

    let err = SqliteRepository::new(&path).err().unwrap();
    assert!(matches!(err, RepositoryError::Storage { .. }));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_reopen_keeps_projects() {
    let dir = std::env::temp_dir().join(format!("peerscore-reopen-{}", ProjectId::new()));
    let path = dir.join("state.db");
    let project = versioned(formation_project(4));
    {
        let repo = SqliteRepository::new(&path).unwrap();
        repo.persist(&project).await.unwrap();
    }

    let repo = SqliteRepository::new(&path).unwrap();
    assert_eq!(repo.find_by_id(&project.id()).await.unwrap(), Some(project));
    let _ = std::fs::remove_dir_all(&dir);
}
