use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::Level;

use peerscore_core::{CompletenessPolicy, Consensuality};

use crate::policy::ScoringPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// Thresholds applied to every review round.
    pub policy: ScoringPolicy,
    /// Directory for persistent state (SQLite database).
    /// Defaults to current working directory.
    pub state_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = CompletenessPolicy::default();

        let min_score_sum = parse_or(&lookup, "PEERSCORE_MIN_SCORE_SUM", defaults.min_score_sum)?;
        let max_score_sum = parse_or(&lookup, "PEERSCORE_MAX_SCORE_SUM", defaults.max_score_sum)?;
        let completeness = CompletenessPolicy::new(min_score_sum, max_score_sum)
            .context("PEERSCORE_MIN_SCORE_SUM must be positive and not above PEERSCORE_MAX_SCORE_SUM")?;

        let consensual_threshold = parse_or(
            &lookup,
            "PEERSCORE_CONSENSUAL_THRESHOLD",
            Consensuality::DEFAULT_THRESHOLD,
        )?;
        let policy = ScoringPolicy::new(completeness, consensual_threshold)
            .context("PEERSCORE_CONSENSUAL_THRESHOLD must be between 0 and 1")?;

        let state_dir = lookup("PEERSCORE_STATE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let log_level = lookup("PEERSCORE_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .parse::<Level>()
            .context("PEERSCORE_LOG_LEVEL must be one of trace, debug, info, warn, error")?;

        Ok(Config {
            policy,
            state_dir,
            log_level,
        })
    }

    /// Location of the SQLite database inside the state directory.
    pub fn database_path(&self) -> PathBuf {
        self.state_dir.join("peerscore.db")
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Result<f64> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("{} must be a number", key)),
        None => Ok(default),
    }
}
