//! Asset registry: CRUD and search over CI nodes.

use super::{check_limit, LIST_LIMIT_RANGE, SEARCH_LIMIT_RANGE};
use crate::domain::{Ci, CiFilter, CiId, CiPage, CiUpdate, NewCi};
use crate::error::{Error, Result, ValidationError};
use crate::store::{single_row, GraphStore, ReadQuery, WriteQuery};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// CRUD and search over configuration items.
#[derive(Clone)]
pub struct AssetRegistry {
    pub(super) store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("store", &"<dyn GraphStore>")
            .finish()
    }
}

impl AssetRegistry {
    /// Create a registry over a shared store handle.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new CI.
    ///
    /// A UUID v4 id is generated unless `new.id` is set.
    ///
    /// # Errors
    ///
    /// - `Validation` if name or description violate their limits
    /// - `ConstraintViolation` if a caller-supplied id is already taken
    pub async fn create(&self, new: NewCi) -> Result<Ci> {
        new.validate()?;
        let ci = new.into_ci(Utc::now());
        let rows = self
            .store
            .execute_write_query(WriteQuery::CreateCi { ci })
            .await?;
        let ci: Ci = single_row(rows, "create_ci")?.decode("ci")?;
        tracing::info!(ci_id = %ci.id, name = %ci.name, ci_type = %ci.ci_type, "Created CI");
        Ok(ci)
    }

    /// Fetch a CI by id. A missing id is `Ok(None)`.
    pub async fn get(&self, id: &CiId) -> Result<Option<Ci>> {
        let rows = self
            .store
            .execute_query(ReadQuery::CiById { id: id.clone() })
            .await?;
        rows.first().map(|row| row.decode("ci")).transpose()
    }

    /// One page of CIs matching `filter`, ordered by name then id.
    ///
    /// `total_count` counts every CI matching the filter.
    ///
    /// # Errors
    ///
    /// `Validation` if `limit` is outside [1, 1000].
    pub async fn list(&self, filter: CiFilter, limit: usize, offset: usize) -> Result<CiPage> {
        check_limit("limit", limit, LIST_LIMIT_RANGE)?;

        let rows = self
            .store
            .execute_query(ReadQuery::Cis {
                filter,
                limit,
                offset,
            })
            .await?;
        let items = rows
            .iter()
            .map(|row| row.decode("ci"))
            .collect::<Result<Vec<Ci>>>()?;

        let count = self
            .store
            .execute_query(ReadQuery::CountCis { filter })
            .await?;
        let total_count = single_row(count, "count_cis")?.decode("total")?;

        Ok(CiPage {
            items,
            total_count,
            limit,
            offset,
        })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// - `Validation` if the update is empty or carries invalid values
    /// - `CiNotFound` if no CI has this id
    pub async fn update(&self, id: &CiId, update: CiUpdate) -> Result<Ci> {
        update.validate()?;
        let fields: Vec<&str> = update.fields().iter().map(|f| f.as_str()).collect();

        let rows = self
            .store
            .execute_write_query(WriteQuery::UpdateCi {
                id: id.clone(),
                update,
                updated_at: Utc::now(),
            })
            .await?;
        let Some(row) = rows.first() else {
            return Err(Error::CiNotFound(id.clone()));
        };
        let ci: Ci = row.decode("ci")?;
        tracing::info!(ci_id = %id, fields = ?fields, "Updated CI");
        Ok(ci)
    }

    /// Apply an update given as a dynamic JSON object.
    ///
    /// Keys are checked against the updatable field allowlist first.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update), plus `Validation` for immutable or
    /// unknown keys.
    pub async fn update_json(&self, id: &CiId, payload: &Value) -> Result<Ci> {
        let update = CiUpdate::from_json(payload)?;
        self.update(id, update).await
    }

    /// Delete a CI and every relationship touching it.
    ///
    /// Returns `true` if a CI was removed.
    pub async fn delete(&self, id: &CiId) -> Result<bool> {
        let rows = self
            .store
            .execute_write_query(WriteQuery::DetachDeleteCi { id: id.clone() })
            .await?;
        let row = single_row(rows, "detach_delete_ci")?;
        let deleted: usize = row.decode("deleted_count")?;
        if deleted == 0 {
            tracing::warn!(ci_id = %id, "Delete requested for unknown CI");
            return Ok(false);
        }
        let relationships: usize = row.decode("relationships_removed")?;
        tracing::info!(ci_id = %id, relationships_removed = relationships, "Deleted CI");
        Ok(true)
    }

    /// Case-insensitive substring search over name, description and hostname.
    ///
    /// # Errors
    ///
    /// `Validation` if `text` is blank or `limit` is outside [1, 100].
    pub async fn search(&self, text: &str, limit: usize) -> Result<Vec<Ci>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty {
                field: "search text",
            }
            .into());
        }
        check_limit("limit", limit, SEARCH_LIMIT_RANGE)?;

        let rows = self
            .store
            .execute_query(ReadQuery::SearchCis {
                text: text.to_string(),
                limit,
            })
            .await?;
        rows.iter().map(|row| row.decode("ci")).collect()
    }

    /// Total number of CIs.
    pub async fn count(&self) -> Result<usize> {
        let rows = self
            .store
            .execute_query(ReadQuery::CountCis {
                filter: CiFilter::default(),
            })
            .await?;
        single_row(rows, "count_cis")?.decode("total")
    }
}
