//! Relationship registry: CRUD over typed directed edges.

use super::{check_limit, LIST_LIMIT_RANGE};
use crate::domain::{
    CiId, Direction, GraphStats, RelatedCi, Relationship, RelationshipId, RelationshipProperties,
    RelationshipSummary, RelationshipType, TypeCount,
};
use crate::error::{Error, Result};
use crate::store::{single_row, GraphStore, ReadQuery, Record, WriteQuery};
use chrono::Utc;
use std::sync::Arc;

/// CRUD over relationships between CIs.
#[derive(Clone)]
pub struct RelationshipRegistry {
    store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for RelationshipRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipRegistry")
            .field("store", &"<dyn GraphStore>")
            .finish()
    }
}

impl RelationshipRegistry {
    /// Create a registry over a shared store handle.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Create a relationship from `source_id` to `target_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` if weight or description are out of range
    /// - `ConstraintViolation` naming the missing endpoint(s) if either CI
    ///   does not exist; nothing is persisted in that case
    pub async fn create(
        &self,
        source_id: &CiId,
        target_id: &CiId,
        relationship_type: RelationshipType,
        properties: Option<RelationshipProperties>,
    ) -> Result<Relationship> {
        let properties = properties.unwrap_or_default();
        properties.validate()?;

        let relationship = Relationship::new(
            source_id.clone(),
            target_id.clone(),
            relationship_type,
            properties,
            Utc::now(),
        );
        let rows = self
            .store
            .execute_write_query(WriteQuery::CreateRelationship { relationship })
            .await?;

        let Some(row) = rows.first() else {
            return Err(self.missing_endpoint_error(source_id, target_id).await);
        };
        let relationship: Relationship = row.decode("relationship")?;
        tracing::info!(
            relationship_id = %relationship.id,
            source = %source_id,
            target = %target_id,
            relationship_type = %relationship_type,
            "Created relationship"
        );
        Ok(relationship)
    }

    /// Build the constraint error for a rejected edge, naming whichever
    /// endpoint is absent.
    async fn missing_endpoint_error(&self, source_id: &CiId, target_id: &CiId) -> Error {
        let rows = match self
            .store
            .execute_query(ReadQuery::CiSummaries {
                ids: vec![source_id.clone(), target_id.clone()],
            })
            .await
        {
            Ok(rows) => rows,
            Err(e) => return e,
        };
        let present: Vec<CiId> = rows
            .iter()
            .filter_map(|row| row.decode::<CiId>("id").ok())
            .collect();

        let missing: Vec<String> = [("source", source_id), ("target", target_id)]
            .into_iter()
            .filter(|(_, id)| !present.contains(id))
            .map(|(role, id)| format!("{role} CI '{id}'"))
            .collect();

        if missing.is_empty() {
            Error::ConstraintViolation(format!(
                "relationship {source_id} -> {target_id} was not created"
            ))
        } else {
            Error::ConstraintViolation(format!("{} does not exist", missing.join(" and ")))
        }
    }

    /// Every edge touching `ci_id` in the requested direction, seen from
    /// `ci_id`. A self-loop appears once per direction it matches.
    pub async fn list_for(&self, ci_id: &CiId, direction: Direction) -> Result<Vec<RelatedCi>> {
        let rows = self
            .store
            .execute_query(ReadQuery::CiRelationships {
                ci_id: ci_id.clone(),
                direction,
            })
            .await?;
        rows.iter().map(related_from_row).collect()
    }

    /// Delete a relationship. Returns `false` if it did not exist.
    pub async fn delete(&self, id: &RelationshipId) -> Result<bool> {
        let rows = self
            .store
            .execute_write_query(WriteQuery::DeleteRelationship { id: id.clone() })
            .await?;
        let deleted: usize = single_row(rows, "delete_relationship")?.decode("deleted_count")?;
        if deleted == 0 {
            tracing::warn!(relationship_id = %id, "Delete requested for unknown relationship");
            Ok(false)
        } else {
            tracing::info!(relationship_id = %id, "Deleted relationship");
            Ok(true)
        }
    }

    /// Every relationship, most recently created first.
    ///
    /// # Errors
    ///
    /// `Validation` if `limit` is outside [1, 1000].
    pub async fn list_all(&self, limit: usize, offset: usize) -> Result<Vec<RelationshipSummary>> {
        check_limit("limit", limit, LIST_LIMIT_RANGE)?;
        let rows = self
            .store
            .execute_query(ReadQuery::Relationships { limit, offset })
            .await?;
        rows.iter()
            .map(|row| -> Result<RelationshipSummary> {
                Ok(RelationshipSummary {
                    id: row.decode("id")?,
                    relationship_type: row.decode("relationship_type")?,
                    created_at: row.decode("created_at")?,
                    source_id: row.decode("source_id")?,
                    source_name: row.decode("source_name")?,
                    target_id: row.decode("target_id")?,
                    target_name: row.decode("target_name")?,
                })
            })
            .collect()
    }

    /// Graph totals and the relationship type histogram.
    pub async fn graph_stats(&self) -> Result<GraphStats> {
        let counts = single_row(
            self.store.execute_query(ReadQuery::GraphCounts).await?,
            "graph_counts",
        )?;
        let relationship_types = self
            .store
            .execute_query(ReadQuery::RelationshipTypeCounts)
            .await?
            .iter()
            .map(|row| -> Result<TypeCount> {
                Ok(TypeCount {
                    relationship_type: row.decode("relationship_type")?,
                    count: row.decode("count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GraphStats {
            total_cis: counts.decode("total_cis")?,
            total_relationships: counts.decode("total_relationships")?,
            relationship_type_count: counts.decode("relationship_type_count")?,
            relationship_types,
        })
    }
}

fn related_from_row(row: &Record) -> Result<RelatedCi> {
    Ok(RelatedCi {
        relationship_id: row.decode("rel_id")?,
        relationship_type: row.decode("rel_type")?,
        created_at: row.decode("rel_created_at")?,
        related_id: row.decode("related_id")?,
        related_name: row.decode("related_name")?,
        direction: row.decode("direction")?,
    })
}
