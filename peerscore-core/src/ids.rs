//! Typed identifiers.
//!
//! Every aggregate and record gets its own UUID newtype so that a `RoleId`
//! can never be passed where a `ReviewTopicId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::MalformedId {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a project aggregate.
    ProjectId,
    "project"
);
uuid_id!(
    /// Identifier of a team seat within a project.
    RoleId,
    "role"
);
uuid_id!(
    /// Identifier of a review topic.
    ReviewTopicId,
    "review topic"
);
uuid_id!(
    /// Identifier of a review round.
    MilestoneId,
    "milestone"
);
uuid_id!(PeerReviewId, "peer review");
uuid_id!(ContributionId, "contribution");
uuid_id!(
    /// Identity of a user supplied by the surrounding user directory.
    UserId,
    "user"
);

/// Namespace for deterministic ids derived from other ids (UUID v5).
const DERIVED_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4b5d_4e1f_9c3a_7d20_b8e4_51a6);

/// Derives a stable UUID from a sequence of parent ids.
///
/// The same inputs always produce the same id, so system-generated records
/// (absent peer reviews, contributions) are reproducible across replays.
pub fn derive_uuid(tag: &str, parts: &[&Uuid]) -> Uuid {
    let mut name = Vec::with_capacity(tag.len() + parts.len() * 16);
    name.extend_from_slice(tag.as_bytes());
    for part in parts {
        name.extend_from_slice(part.as_bytes());
    }
    Uuid::new_v5(&DERIVED_NAMESPACE, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_uuid() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id: RoleId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_rejects_malformed_id() {
        let err = "not-a-uuid".parse::<ProjectId>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedId {
                kind: "project",
                value: "not-a-uuid".to_string()
            }
        );
    }

    #[test]
    fn test_derived_ids_are_deterministic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(derive_uuid("x", &[&a, &b]), derive_uuid("x", &[&a, &b]));
        assert_ne!(derive_uuid("x", &[&a, &b]), derive_uuid("x", &[&b, &a]));
        assert_ne!(derive_uuid("x", &[&a]), derive_uuid("y", &[&a]));
    }

    #[test]
    fn test_serializes_transparently() {
        let id = MilestoneId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
