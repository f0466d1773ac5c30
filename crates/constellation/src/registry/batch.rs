//! Best-effort creation of a CI together with its outgoing relationships.

use super::{AssetRegistry, RelationshipRegistry};
use crate::domain::{
    Ci, CiId, NewCi, Relationship, RelationshipProperties, RelationshipRequest, RelationshipType,
};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of [`AssetRegistry::create_with_relationships`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CiCreationReport {
    /// The committed CI.
    pub ci: Ci,
    /// Relationships that were created.
    pub created_relationships: Vec<Relationship>,
    /// Requests that failed, with reasons.
    pub failed_relationships: Vec<FailedRelationship>,
}

impl CiCreationReport {
    /// Whether every requested relationship was created.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_relationships.is_empty()
    }
}

/// A requested relationship that could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRelationship {
    /// Requested target.
    pub target_id: CiId,
    /// Requested type.
    pub relationship_type: RelationshipType,
    /// Error message.
    pub reason: String,
}

impl AssetRegistry {
    /// Create a CI, then attempt each requested outgoing relationship on its
    /// own.
    ///
    /// Relationship failures are collected in the report; nothing is rolled
    /// back.
    ///
    /// # Errors
    ///
    /// Only failures creating the CI itself are returned as errors.
    pub async fn create_with_relationships(
        &self,
        new: NewCi,
        requests: Vec<RelationshipRequest>,
    ) -> Result<CiCreationReport> {
        let ci = self.create(new).await?;
        let relationships = RelationshipRegistry::new(Arc::clone(&self.store));

        let mut created_relationships = Vec::new();
        let mut failed_relationships = Vec::new();

        for request in requests {
            let properties = request
                .description
                .map(RelationshipProperties::described);
            match relationships
                .create(&ci.id, &request.target_id, request.relationship_type, properties)
                .await
            {
                Ok(rel) => created_relationships.push(rel),
                Err(e) => {
                    tracing::warn!(
                        ci_id = %ci.id,
                        target = %request.target_id,
                        relationship_type = %request.relationship_type,
                        error = %e,
                        "Relationship in batch create failed"
                    );
                    failed_relationships.push(FailedRelationship {
                        target_id: request.target_id,
                        relationship_type: request.relationship_type,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(CiCreationReport {
            ci,
            created_relationships,
            failed_relationships,
        })
    }
}
