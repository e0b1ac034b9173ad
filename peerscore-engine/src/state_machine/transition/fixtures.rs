//! Builders shared by the transition tests.

use peerscore_core::{
    Description, Email, MilestoneId, PeerReviewId, PeerReviewScore, ProjectId, ReviewScope,
    ReviewTopicId, ReviewTopicInput, RoleId, Title, UserId, UserIdentity,
};

use super::{transition, TransitionResult};
use crate::error::DomainError;
use crate::policy::ScoringPolicy;
use crate::project::{Project, ProjectDraft, ProjectSettings};
use crate::state_machine::{Command, PeerReviewDraft};

pub(crate) fn title(s: &str) -> Title {
    Title::new(s).unwrap()
}

pub(crate) fn user(n: usize) -> UserIdentity {
    UserIdentity::new(
        UserId::new(),
        Email::new(format!("member{}@example.org", n)).unwrap(),
    )
}

pub(crate) fn run(project: Project, command: Command) -> TransitionResult {
    transition(project, command, &ScoringPolicy::default()).unwrap()
}

pub(crate) fn run_err(project: Project, command: Command) -> DomainError {
    transition(project, command, &ScoringPolicy::default()).unwrap_err()
}

/// A fresh project in formation with no roles or topics.
pub(crate) fn new_project(settings: ProjectSettings) -> Project {
    Project::create(ProjectDraft {
        id: ProjectId::new(),
        title: title("Capstone"),
        description: Description::empty(),
        creator_id: UserId::new(),
        settings,
    })
    .project
}

pub(crate) fn add_role(project: Project) -> (Project, RoleId) {
    let role_id = RoleId::new();
    let project = run(
        project,
        Command::AddRole {
            role_id,
            title: title("Engineer"),
            description: Description::empty(),
        },
    )
    .project;
    (project, role_id)
}

pub(crate) fn add_topic(project: Project) -> (Project, ReviewTopicId) {
    let review_topic_id = ReviewTopicId::new();
    let project = run(
        project,
        Command::AddReviewTopic {
            review_topic_id,
            title: title("Effort"),
            description: Description::empty(),
            input: ReviewTopicInput::default(),
        },
    )
    .project;
    (project, review_topic_id)
}

/// A project in formation with `roles` assigned roles and one review topic.
pub(crate) fn formation_project(roles: usize) -> Project {
    formation_project_with(roles, 1, ProjectSettings::default())
}

pub(crate) fn formation_project_with(
    roles: usize,
    topics: usize,
    settings: ProjectSettings,
) -> Project {
    let mut project = new_project(settings);
    for n in 0..roles {
        let (next, role_id) = add_role(project);
        project = run(
            next,
            Command::AssignUser {
                role_id,
                user: user(n),
            },
        )
        .project;
    }
    for _ in 0..topics {
        project = add_topic(project).0;
    }
    project
}

pub(crate) fn active_project(roles: usize, topics: usize) -> Project {
    active_project_with(roles, topics, ProjectSettings::default())
}

pub(crate) fn active_project_with(
    roles: usize,
    topics: usize,
    settings: ProjectSettings,
) -> Project {
    run(
        formation_project_with(roles, topics, settings),
        Command::FinishFormation,
    )
    .project
}

pub(crate) fn with_milestone(project: Project) -> (Project, MilestoneId) {
    let milestone_id = MilestoneId::new();
    let project = run(
        project,
        Command::AddMilestone {
            milestone_id,
            title: title("Sprint"),
            description: Description::empty(),
        },
    )
    .project;
    (project, milestone_id)
}

/// Drafts from `sender` to every other role for one topic, using `scores`
/// in role order with the sender's own slot skipped.
pub(crate) fn drafts_for(
    project: &Project,
    milestone_id: MilestoneId,
    topic: ReviewTopicId,
    sender: RoleId,
    scores: &[f64],
) -> Vec<PeerReviewDraft> {
    project
        .role_ids()
        .into_iter()
        .filter(|r| *r != sender)
        .zip(scores)
        .map(|(receiver, score)| PeerReviewDraft {
            id: PeerReviewId::new(),
            sender_role_id: sender,
            receiver_role_id: receiver,
            review_topic_id: topic,
            milestone_id,
            score: PeerReviewScore::new(*score).unwrap(),
        })
        .collect()
}

/// Drafts from `sender` with equal shares for every topic.
pub(crate) fn uniform_drafts(
    project: &Project,
    milestone_id: MilestoneId,
    sender: RoleId,
) -> Vec<PeerReviewDraft> {
    let n = project.roles().len();
    let scores = vec![1.0 / (n - 1) as f64; n - 1];
    project
        .review_topic_ids()
        .into_iter()
        .flat_map(|topic| drafts_for(project, milestone_id, topic, sender, &scores))
        .collect()
}

/// Every role submits equal shares for every topic.
pub(crate) fn submit_all_uniform(mut project: Project, milestone_id: MilestoneId) -> Project {
    for sender in project.role_ids() {
        let peer_reviews = uniform_drafts(&project, milestone_id, sender);
        project = run(project, Command::SubmitPeerReviews { peer_reviews }).project;
    }
    project
}
