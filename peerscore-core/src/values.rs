//! Validated scalar and text value objects.
//!
//! Construction is the only place range and format checks happen; once a
//! value exists it is known to be valid. Deserialization goes through the
//! same checks via `serde(try_from)`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::UserId;

fn check_finite(kind: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { kind })
    }
}

fn check_range(kind: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    let value = check_finite(kind, value)?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            kind,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

macro_rules! unit_scalar {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(try_from = "f64", into = "f64")]
        pub struct $name(f64);

        impl $name {
            pub fn new(value: f64) -> Result<Self, ValidationError> {
                check_range($label, value, 0.0, 1.0).map(Self)
            }

            /// Builds the value after clamping into [0, 1]. Non-finite input is
            /// still rejected.
            pub fn clamped(value: f64) -> Result<Self, ValidationError> {
                check_finite($label, value).map(|v| Self(v.clamp(0.0, 1.0)))
            }

            pub fn value(&self) -> f64 {
                self.0
            }
        }

        impl TryFrom<f64> for $name {
            type Error = ValidationError;

            fn try_from(value: f64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.4}", self.0)
            }
        }
    };
}

unit_scalar!(
    /// One sender's rating of one receiver, as a share of the sender's total.
    PeerReviewScore,
    "peer review score"
);
unit_scalar!(
    /// Agreement among reviewers for a review topic. 1 is perfect agreement.
    Consensuality,
    "consensuality"
);
unit_scalar!(
    /// Degree of reciprocal over-scoring between pairs of roles.
    Cliquism,
    "cliquism"
);

impl PeerReviewScore {
    pub const ZERO: PeerReviewScore = PeerReviewScore(0.0);
}

impl Consensuality {
    /// Default threshold at or above which a review topic counts as consensual.
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    pub fn is_consensual(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

/// Agreement of the group about a single receiver, in (0, 1].
///
/// Never exactly zero: anything below [`Agreement::EPSILON`] is clamped up.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Agreement(f64);

impl Agreement {
    pub const EPSILON: f64 = 1e-6;

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        let value = check_range("agreement", value, 0.0, 1.0)?;
        Ok(Self(value.max(Self::EPSILON)))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Agreement {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Agreement> for f64 {
    fn from(v: Agreement) -> f64 {
        v.0
    }
}

/// A role's derived share of credit within a review topic.
///
/// Unrestricted in sign, typically close to `1/n`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ContributionAmount(f64);

impl ContributionAmount {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        check_finite("contribution", value).map(Self)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ContributionAmount {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContributionAmount> for f64 {
    fn from(v: ContributionAmount) -> f64 {
        v.0
    }
}

impl fmt::Display for ContributionAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Short, non-empty title for projects, roles, topics and milestones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    pub const MAX_LEN: usize = 100;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(ValidationError::Empty { kind: "title" });
        }
        let len = value.chars().count();
        if len > Self::MAX_LEN {
            return Err(ValidationError::TooLong {
                kind: "title",
                len,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Title {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Title> for String {
    fn from(t: Title) -> String {
        t.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form description, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub const MAX_LEN: usize = 1024;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let len = value.chars().count();
        if len > Self::MAX_LEN {
            return Err(ValidationError::TooLong {
                kind: "description",
                len,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(d: Description) -> String {
        d.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub const MAX_LEN: usize = 254;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into().trim().to_string();
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::TooLong {
                kind: "email",
                len: value.len(),
                max: Self::MAX_LEN,
            });
        }
        match value.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(value))
            }
            _ => Err(ValidationError::InvalidEmail(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(e: Email) -> String {
        e.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user identity handed in by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: Email,
}

impl UserIdentity {
    pub fn new(id: UserId, email: Email) -> Self {
        Self { id, email }
    }
}

/// One selectable answer of a discrete review topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteChoice {
    pub label: String,
    pub value: PeerReviewScore,
}

/// How clients collect scores for a review topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewTopicInput {
    /// Any value on a continuous scale.
    Continuous { min: f64, max: f64 },
    /// One of a fixed set of labelled values.
    Discrete { choices: Vec<DiscreteChoice> },
}

impl Default for ReviewTopicInput {
    fn default() -> Self {
        Self::Continuous { min: 0.0, max: 1.0 }
    }
}

impl ReviewTopicInput {
    /// Largest distance at which a score still matches a discrete choice.
    const CHOICE_TOLERANCE: f64 = 1e-9;

    /// Whether a member could have entered `score` through this input.
    pub fn admits(&self, score: PeerReviewScore) -> bool {
        let value = score.value();
        match self {
            Self::Continuous { min, max } => value >= *min && value <= *max,
            Self::Discrete { choices } => choices
                .iter()
                .any(|c| (c.value.value() - value).abs() <= Self::CHOICE_TOLERANCE),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Continuous { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(ValidationError::InvalidInput {
                        reason: "continuous bounds must be finite".to_string(),
                    });
                }
                if min >= max {
                    return Err(ValidationError::InvalidInput {
                        reason: format!("min ({}) must be below max ({})", min, max),
                    });
                }
                Ok(())
            }
            Self::Discrete { choices } => {
                if choices.is_empty() {
                    return Err(ValidationError::InvalidInput {
                        reason: "discrete input needs at least one choice".to_string(),
                    });
                }
                let mut seen = HashSet::new();
                for choice in choices {
                    let label = choice.label.trim();
                    if label.is_empty() {
                        return Err(ValidationError::InvalidInput {
                            reason: "choice labels must not be empty".to_string(),
                        });
                    }
                    if !seen.insert(label.to_lowercase()) {
                        return Err(ValidationError::InvalidInput {
                            reason: format!("duplicate choice label {:?}", label),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}
