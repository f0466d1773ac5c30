//! Relationship types and the read models built from them.

use super::{
    char_len, CiId, Direction, RelationshipId, RelationshipStrength, RelationshipType,
    MAX_RELATIONSHIP_DESCRIPTION_LENGTH, WEIGHT_RANGE,
};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed, directed edge from `source_id` to `target_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier.
    pub id: RelationshipId,
    /// Edge tail.
    pub source_id: CiId,
    /// Edge head.
    pub target_id: CiId,
    /// Edge type.
    pub relationship_type: RelationshipType,
    /// Strength.
    #[serde(default)]
    pub strength: RelationshipStrength,
    /// Weight in [0, 10].
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Whether the relationship is currently in effect.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Whether a person has confirmed the relationship.
    #[serde(default)]
    pub verified: bool,
    /// Whether discovery tooling created the relationship.
    #[serde(default)]
    pub auto_discovered: bool,
    /// Free-text description (at most 500 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Conditions under which the relationship holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    /// Network port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Network protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Discovery tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_by: Option<String>,
    /// Discovery time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime<Utc>>,
    /// Last verification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<DateTime<Utc>>,
    /// Open attribute map.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom_attributes: Map<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Relationship {
    /// Build a new relationship with a fresh id, stamped at `now`.
    #[must_use]
    pub fn new(
        source_id: CiId,
        target_id: CiId,
        relationship_type: RelationshipType,
        properties: RelationshipProperties,
        now: DateTime<Utc>,
    ) -> Self {
        let RelationshipProperties {
            strength,
            weight,
            active,
            verified,
            auto_discovered,
            description,
            conditions,
            port,
            protocol,
            discovered_by,
            discovered_at,
            last_verified,
            custom_attributes,
        } = properties;

        Self {
            id: RelationshipId::generate(),
            source_id,
            target_id,
            relationship_type,
            strength,
            weight,
            active,
            verified,
            auto_discovered,
            description,
            conditions,
            port,
            protocol,
            discovered_by,
            discovered_at,
            last_verified,
            custom_attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /// True for relationship types that read the same both ways.
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.relationship_type.is_bidirectional()
    }

    /// Check the invariants a stored relationship must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_weight(self.weight)?;
        validate_description(self.description.as_deref())
    }
}

/// Optional attributes supplied when creating a relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RelationshipProperties {
    pub strength: RelationshipStrength,
    pub weight: f64,
    pub active: bool,
    pub verified: bool,
    pub auto_discovered: bool,
    pub description: Option<String>,
    pub conditions: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub discovered_by: Option<String>,
    pub discovered_at: Option<DateTime<Utc>>,
    pub last_verified: Option<DateTime<Utc>>,
    pub custom_attributes: Map<String, Value>,
}

impl Default for RelationshipProperties {
    fn default() -> Self {
        Self {
            strength: RelationshipStrength::default(),
            weight: default_weight(),
            active: true,
            verified: false,
            auto_discovered: false,
            description: None,
            conditions: None,
            port: None,
            protocol: None,
            discovered_by: None,
            discovered_at: None,
            last_verified: None,
            custom_attributes: Map::new(),
        }
    }
}

impl RelationshipProperties {
    /// Default properties with the given description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Check weight range and description length.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_weight(self.weight)?;
        validate_description(self.description.as_deref())
    }
}

pub(crate) fn validate_weight(weight: f64) -> Result<(), ValidationError> {
    let (min, max) = WEIGHT_RANGE;
    if weight.is_finite() && (min..=max).contains(&weight) {
        Ok(())
    } else {
        Err(ValidationError::WeightOutOfRange {
            value: weight,
            min,
            max,
        })
    }
}

fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description.map(char_len) {
        Some(len) if len > MAX_RELATIONSHIP_DESCRIPTION_LENGTH => Err(ValidationError::TooLong {
            field: "description",
            max: MAX_RELATIONSHIP_DESCRIPTION_LENGTH,
            actual: len,
        }),
        _ => Ok(()),
    }
}

/// An outgoing relationship requested alongside CI creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRequest {
    /// Target CI.
    pub target_id: CiId,
    /// Edge type.
    pub relationship_type: RelationshipType,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RelationshipRequest {
    /// A request without description.
    pub fn new(target_id: impl Into<CiId>, relationship_type: RelationshipType) -> Self {
        Self {
            target_id: target_id.into(),
            relationship_type,
            description: None,
        }
    }
}

/// One edge incident to a CI, seen from that CI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCi {
    /// Relationship id.
    pub relationship_id: RelationshipId,
    /// Relationship type.
    pub relationship_type: RelationshipType,
    /// Relationship creation time.
    pub created_at: DateTime<Utc>,
    /// The CI at the other end.
    pub related_id: CiId,
    /// Name of the CI at the other end.
    pub related_name: String,
    /// `outgoing` if the edge leaves the queried CI, `incoming` otherwise.
    pub direction: Direction,
}

/// A relationship with both endpoint names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RelationshipSummary {
    pub id: RelationshipId,
    pub relationship_type: RelationshipType,
    pub created_at: DateTime<Utc>,
    pub source_id: CiId,
    pub source_name: String,
    pub target_id: CiId,
    pub target_name: String,
}

/// Count of relationships of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    /// Relationship type.
    pub relationship_type: RelationshipType,
    /// Number of edges of that type.
    pub count: usize,
}

/// Graph-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of CIs.
    pub total_cis: usize,
    /// Number of relationships.
    pub total_relationships: usize,
    /// Number of distinct relationship types in use.
    pub relationship_type_count: usize,
    /// Per-type histogram, most frequent first.
    pub relationship_types: Vec<TypeCount>,
}
