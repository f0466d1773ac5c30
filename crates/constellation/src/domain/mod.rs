//! Domain types for the configuration management database.
//!
//! Configuration items ([`Ci`]) are graph nodes; [`Relationship`]s are typed,
//! directed edges between them. Everything here is a plain value object with
//! validation but no storage behavior.

use serde::{Deserialize, Serialize};
use std::fmt;

mod ci;
mod enums;
mod relationship;
mod risk;

pub use ci::{Ci, CiField, CiFilter, CiPage, CiUpdate, NewCi, IMMUTABLE_CI_FIELDS};
pub use enums::{
    CiType, Criticality, Direction, Environment, LifecycleState, RelationshipStrength,
    RelationshipType,
};
pub use relationship::{
    GraphStats, RelatedCi, Relationship, RelationshipProperties, RelationshipRequest,
    RelationshipSummary, TypeCount,
};
pub use risk::{RiskAssessment, RISK_SCORE_RANGE};

/// Maximum CI name length in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum CI description length in characters.
pub const MAX_CI_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum relationship description length in characters.
pub const MAX_RELATIONSHIP_DESCRIPTION_LENGTH: usize = 500;

/// Inclusive bounds for relationship weight.
pub const WEIGHT_RANGE: (f64, f64) = (0.0, 10.0);

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random (UUID v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Unique identifier for a configuration item.
    CiId
}

string_id! {
    /// Unique identifier for a relationship.
    RelationshipId
}

/// Count characters, not bytes, for length limits.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_uuid_v4() {
        let id = CiId::generate();
        let parsed = uuid::Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(RelationshipId::generate(), RelationshipId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = CiId::new("web-01");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"web-01\"");
        assert_eq!(id.to_string(), "web-01");
    }

    #[test]
    fn char_len_counts_unicode_scalars() {
        assert_eq!(char_len("héllo"), 5);
    }
}
