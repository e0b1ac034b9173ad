use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use peerscore_core::{
    CliquismComputer, ConsensualityComputer, ConsensualityOutcome, ContributionsComputer,
    Description, Email, MilestoneId, PeerReviewId, PeerReviewScore, ProjectId, ReviewTopicId,
    ReviewTopicInput, RoleId, ScoreMatrix, Title, UserId, UserIdentity,
};
use peerscore_engine::{
    Command, Config, EventPublisher, InMemoryRepository, PeerReviewDraft, ProjectDraft,
    ProjectRepository, ProjectService, ProjectSettings, SkipManagerReview, SqliteRepository,
    TracingPublisher,
};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Peer review scoring for team projects
#[derive(Parser, Debug)]
#[command(name = "peerscore")]
#[command(about = "Peer review scoring for team projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a raw peer review matrix
    Score(ScoreArgs),
    /// Run one milestone of a project through the full lifecycle
    Simulate(SimulateArgs),
    /// Print the stored event log of a project
    Events(EventsArgs),
    /// Print version information
    Version,
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    /// JSON file holding a square matrix; row i is rater i's scores
    #[arg(long)]
    input: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// JSON file holding a square matrix; row i is role i's submission
    #[arg(long)]
    input: PathBuf,

    /// Roles that never submit; their reviews are filled in as absent
    #[arg(long, num_args = 1..)]
    absent: Vec<usize>,

    /// When the milestone may skip the manager review
    #[arg(long, value_enum, default_value_t = SkipArg::No)]
    skip_manager_review: SkipArg,

    /// Store the project and its events in the SQLite database under
    /// PEERSCORE_STATE_DIR
    #[arg(long)]
    persist: bool,
}

#[derive(Parser, Debug)]
struct EventsArgs {
    /// Project id as printed by `simulate --persist`
    project_id: ProjectId,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SkipArg {
    No,
    Yes,
    IfConsensual,
}

impl From<SkipArg> for SkipManagerReview {
    fn from(arg: SkipArg) -> Self {
        match arg {
            SkipArg::No => SkipManagerReview::No,
            SkipArg::Yes => SkipManagerReview::Yes,
            SkipArg::IfConsensual => SkipManagerReview::IfConsensual,
        }
    }
}

#[derive(Serialize)]
struct ScoreReport {
    contributions: Vec<f64>,
    consensuality: f64,
    agreements: Vec<f64>,
    cliquism: f64,
}

#[derive(Serialize)]
struct RoleReport {
    role: String,
    contribution: Option<f64>,
    absent: bool,
}

#[derive(Serialize)]
struct SimulationReport {
    project_id: ProjectId,
    milestone_state: String,
    consensuality: Option<f64>,
    cliquism: Option<f64>,
    roles: Vec<RoleReport>,
}

fn read_matrix(path: &Path) -> Result<ScoreMatrix> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read matrix from {}", path.display()))?;
    let rows: Vec<Vec<f64>> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of number arrays", path.display()))?;
    ScoreMatrix::new(rows).with_context(|| format!("Invalid matrix in {}", path.display()))
}

fn run_score(args: ScoreArgs) -> Result<()> {
    let matrix = read_matrix(&args.input)?;

    let contributions = ContributionsComputer::compute(&matrix)?;
    let ConsensualityOutcome {
        consensuality,
        agreements,
    } = ConsensualityComputer::compute(&matrix)?;
    let cliquism = CliquismComputer::compute(&matrix)?;

    let report = ScoreReport {
        contributions,
        consensuality: consensuality.value(),
        agreements: agreements.iter().map(|a| a.value()).collect(),
        cliquism: cliquism.value(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_simulate(config: &Config, args: SimulateArgs) -> Result<()> {
    let matrix = read_matrix(&args.input)?;
    let n = matrix.n();
    let absent: BTreeSet<usize> = args.absent.iter().copied().collect();
    if let Some(&bad) = absent.iter().find(|&&i| i >= n) {
        bail!("Absent role {} out of range for {} roles", bad, n);
    }

    let service = if args.persist {
        fs::create_dir_all(&config.state_dir).with_context(|| {
            format!(
                "Failed to create state directory {}",
                config.state_dir.display()
            )
        })?;
        let path = config.database_path();
        info!("Persisting to {}", path.display());
        let store = Arc::new(
            SqliteRepository::new(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
        );
        let repository: Arc<dyn ProjectRepository> = store.clone();
        let publisher: Arc<dyn EventPublisher> = store;
        ProjectService::new(repository, publisher, config.policy)
    } else {
        ProjectService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(TracingPublisher),
            config.policy,
        )
    };

    let project = service
        .create_project(ProjectDraft {
            id: ProjectId::new(),
            title: Title::new("Simulation")?,
            description: Description::empty(),
            creator_id: UserId::new(),
            settings: ProjectSettings {
                skip_manager_review: args.skip_manager_review.into(),
                ..ProjectSettings::default()
            },
        })
        .await?;
    let project_id = project.id();

    let mut roles = Vec::with_capacity(n);
    for i in 0..n {
        let role_id = RoleId::new();
        service
            .execute(
                project_id,
                Command::AddRole {
                    role_id,
                    title: Title::new(format!("Role {}", i))?,
                    description: Description::empty(),
                },
            )
            .await?;
        service
            .execute(
                project_id,
                Command::AssignUser {
                    role_id,
                    user: UserIdentity::new(
                        UserId::new(),
                        Email::new(format!("role{}@peerscore.invalid", i))?,
                    ),
                },
            )
            .await?;
        roles.push(role_id);
    }

    let topic = ReviewTopicId::new();
    service
        .execute(
            project_id,
            Command::AddReviewTopic {
                review_topic_id: topic,
                title: Title::new("Contribution")?,
                description: Description::empty(),
                input: ReviewTopicInput::default(),
            },
        )
        .await?;
    service
        .execute(project_id, Command::FinishFormation)
        .await?;

    let milestone = MilestoneId::new();
    service
        .execute(
            project_id,
            Command::AddMilestone {
                milestone_id: milestone,
                title: Title::new("Milestone 1")?,
                description: Description::empty(),
            },
        )
        .await?;

    for (i, sender) in roles.iter().enumerate() {
        if absent.contains(&i) {
            continue;
        }
        let peer_reviews = roles
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, receiver)| -> Result<PeerReviewDraft> {
                Ok(PeerReviewDraft {
                    id: PeerReviewId::new(),
                    sender_role_id: *sender,
                    receiver_role_id: *receiver,
                    review_topic_id: topic,
                    milestone_id: milestone,
                    score: PeerReviewScore::new(matrix.get(i, j))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        service
            .execute(project_id, Command::SubmitPeerReviews { peer_reviews })
            .await
            .with_context(|| format!("Submission of role {} rejected", i))?;
    }
    if !absent.is_empty() {
        service
            .execute(project_id, Command::CompletePeerReviews)
            .await?;
    }

    let project = service.find(project_id).await?;
    let milestone_state = project
        .milestone(&milestone)
        .map(|m| m.state.to_string())
        .ok_or_else(|| anyhow!("Milestone {} disappeared", milestone))?;
    let review_topic = project.review_topic(&topic);
    let contributions = project.contributions_for_milestone(&milestone);

    let report = SimulationReport {
        project_id,
        milestone_state,
        consensuality: review_topic
            .and_then(|t| t.consensuality)
            .map(|c| c.value()),
        cliquism: review_topic.and_then(|t| t.cliquism).map(|c| c.value()),
        roles: roles
            .iter()
            .enumerate()
            .map(|(i, role_id)| RoleReport {
                role: format!("Role {}", i),
                contribution: contributions
                    .iter()
                    .find(|c| c.role_id == *role_id)
                    .map(|c| c.amount.value()),
                absent: absent.contains(&i),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_events(config: &Config, args: EventsArgs) -> Result<()> {
    let path = config.database_path();
    if !path.exists() {
        bail!("No database at {}", path.display());
    }
    let store = SqliteRepository::new(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let events = store.events_for(&args.project_id).await?;
    if events.is_empty() {
        bail!("No events stored for project {}", args.project_id);
    }
    for event in events {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn version() -> String {
    let hash = option_env!("PEERSCORE_GIT_HASH").or(built_info::GIT_COMMIT_HASH);
    match hash {
        Some(hash) => format!("{} ({})", built_info::PKG_VERSION, &hash[..hash.len().min(8)]),
        None => built_info::PKG_VERSION.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Score(args) => run_score(args),
        Commands::Simulate(args) => run_simulate(&config, args).await,
        Commands::Events(args) => run_events(&config, args).await,
        Commands::Version => {
            println!("peerscore {}", version());
            Ok(())
        }
    }
}
