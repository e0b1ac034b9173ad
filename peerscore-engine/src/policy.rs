//! Tunable scoring thresholds.

use peerscore_core::{CompletenessPolicy, Consensuality, ValidationError};

/// Thresholds the milestone state machine applies when judging a round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Band one sender's scores for one review topic must sum into.
    pub completeness: CompletenessPolicy,
    /// Consensuality at or above which a review topic counts as consensual.
    pub consensual_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            completeness: CompletenessPolicy::default(),
            consensual_threshold: Consensuality::DEFAULT_THRESHOLD,
        }
    }
}

impl ScoringPolicy {
    pub fn new(
        completeness: CompletenessPolicy,
        consensual_threshold: f64,
    ) -> Result<Self, ValidationError> {
        if !consensual_threshold.is_finite() || !(0.0..=1.0).contains(&consensual_threshold) {
            return Err(ValidationError::OutOfRange {
                kind: "consensual threshold",
                value: consensual_threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self {
            completeness,
            consensual_threshold,
        })
    }

    pub fn is_consensual(&self, consensuality: Consensuality) -> bool {
        consensuality.is_consensual(self.consensual_threshold)
    }
}
