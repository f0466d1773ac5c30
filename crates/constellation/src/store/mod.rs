//! Graph store contract and backends.
//!
//! The core never touches graph internals directly. Registries and analysis
//! engines issue typed statements through [`GraphStore`] and decode the
//! returned [`Record`]s into domain types. Statements are a closed set:
//! [`ReadQuery`] for lookups and traversal frontiers, [`WriteQuery`] for
//! single-statement mutations.
//!
//! # Backends
//!
//! - [`MemoryGraphStore`] without a snapshot path: ephemeral, for tests
//! - [`MemoryGraphStore`] with a snapshot path: the whole graph is loaded on
//!   [`connect`](GraphStore::connect) and rewritten atomically after every
//!   successful write
//!
//! # Example
//!
//! ```no_run
//! use constellation::store::{GraphStore, MemoryGraphStore, ReadQuery};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::ephemeral());
//!     store.connect().await?;
//!     let rows = store.execute_query(ReadQuery::GraphCounts).await?;
//!     println!("{:?}", rows[0].get("total_cis"));
//!     store.disconnect().await?;
//!     Ok(())
//! }
//! ```

use crate::domain::{
    Ci, CiFilter, CiId, CiUpdate, Direction, Relationship, RelationshipId, RelationshipType,
};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod memory;

pub use memory::{LoadWarning, MemoryGraphStore};

/// Default time to wait for the store lock before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Contract between the core and a graph store.
///
/// Implementations must be safe to share as `Arc<dyn GraphStore>`; every
/// method takes `&self`. Each write statement is applied atomically: it either
/// takes full effect or none.
///
/// # Errors
///
/// Every query fails fast with [`Error::StoreUnavailable`](crate::error::Error::StoreUnavailable)
/// while the store is disconnected or when the store cannot be acquired
/// within its timeout.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open the store. Calling `connect` on a connected store is a no-op.
    async fn connect(&self) -> Result<()>;

    /// Close the store. Later queries fail with `StoreUnavailable`.
    async fn disconnect(&self) -> Result<()>;

    /// Round-trip a trivial statement to prove the store answers.
    async fn verify_connectivity(&self) -> Result<()>;

    /// Whether [`connect`](Self::connect) has succeeded and no disconnect followed.
    fn is_connected(&self) -> bool;

    /// Run a read-only statement.
    async fn execute_query(&self, query: ReadQuery) -> Result<Vec<Record>>;

    /// Run a write statement as a single transaction.
    async fn execute_write_query(&self, query: WriteQuery) -> Result<Vec<Record>>;
}

/// Read statements.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadQuery {
    /// Liveness check. One row: `ok`.
    Ping,

    /// One CI by id. Zero or one row: `ci`.
    CiById {
        /// CI id.
        id: CiId,
    },

    /// A page of CIs matching `filter`, ordered by name then id. Rows: `ci`.
    Cis {
        /// Exact-match filter.
        filter: CiFilter,
        /// Page size.
        limit: usize,
        /// Rows to skip.
        offset: usize,
    },

    /// Number of CIs matching `filter`. One row: `total`.
    CountCis {
        /// Exact-match filter.
        filter: CiFilter,
    },

    /// Case-insensitive substring search over name, description and hostname,
    /// ordered by name then id. Rows: `ci`.
    SearchCis {
        /// Search text.
        text: String,
        /// Maximum rows.
        limit: usize,
    },

    /// Edges incident to a CI.
    ///
    /// Rows: `rel_id`, `rel_type`, `rel_created_at`, `related_id`,
    /// `related_name`, `direction`. Outgoing edges come first, each group
    /// ordered by creation time.
    CiRelationships {
        /// The CI.
        ci_id: CiId,
        /// Which edges to include.
        direction: Direction,
    },

    /// Every edge, newest first.
    ///
    /// Rows: `id`, `relationship_type`, `created_at`, `source_id`,
    /// `source_name`, `target_id`, `target_name`.
    Relationships {
        /// Page size.
        limit: usize,
        /// Rows to skip.
        offset: usize,
    },

    /// One row: `total_cis`, `total_relationships`, `relationship_type_count`.
    GraphCounts,

    /// Rows: `relationship_type`, `count`; count descending, then type name.
    RelationshipTypeCounts,

    /// One traversal hop from a frontier.
    ///
    /// For each frontier CI in the given order, every edge of an allowed type
    /// in `direction` relative to it. Rows: `frontier_id`, `neighbor_id`,
    /// `rel_type`, ordered by frontier position then neighbor id then type.
    /// An empty `types` list allows every type.
    EdgesFrom {
        /// CIs to expand.
        frontier: Vec<CiId>,
        /// Edge direction relative to each frontier CI.
        direction: Direction,
        /// Allowed relationship types.
        types: Vec<RelationshipType>,
    },

    /// Every edge whose type is in `types`. Rows: `source_id`, `target_id`.
    EdgesOfType {
        /// Allowed relationship types.
        types: Vec<RelationshipType>,
    },

    /// Id, name, criticality and type for each existing CI in `ids`.
    /// Rows: `id`, `name`, `criticality`, `ci_type`; missing ids are omitted.
    CiSummaries {
        /// CI ids.
        ids: Vec<CiId>,
    },
}

/// Write statements.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteQuery {
    /// Insert a CI. One row: `ci`. Duplicate ids are a constraint violation.
    CreateCi {
        /// The CI.
        ci: Ci,
    },

    /// Apply a partial update. One row `ci`, or no rows if the CI is absent.
    UpdateCi {
        /// CI id.
        id: CiId,
        /// Fields to change.
        update: CiUpdate,
        /// New `updated_at`.
        updated_at: DateTime<Utc>,
    },

    /// Remove a CI and every incident edge.
    /// One row: `deleted_count`, `relationships_removed`.
    DetachDeleteCi {
        /// CI id.
        id: CiId,
    },

    /// Insert an edge. One row `relationship`, or no rows if either endpoint
    /// is absent.
    CreateRelationship {
        /// The relationship.
        relationship: Relationship,
    },

    /// Remove an edge. One row: `deleted_count`.
    DeleteRelationship {
        /// Relationship id.
        id: RelationshipId,
    },
}

impl WriteQuery {
    /// Statement name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCi { .. } => "create_ci",
            Self::UpdateCi { .. } => "update_ci",
            Self::DetachDeleteCi { .. } => "detach_delete_ci",
            Self::CreateRelationship { .. } => "create_relationship",
            Self::DeleteRelationship { .. } => "delete_relationship",
        }
    }
}

/// One result row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    /// An empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Append a serializable value as a column.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if `value` cannot be serialized.
    pub fn with_serialized<T: serde::Serialize>(
        self,
        column: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        Ok(self.with(column, serde_json::to_value(value)?))
    }

    /// Look up a column by name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Decode a column into `T`.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingColumn`] if absent, [`StorageError::Decode`] if
    /// the value has the wrong shape.
    pub fn decode<T: DeserializeOwned>(&self, column: &str) -> Result<T> {
        let value = self
            .get(column)
            .ok_or_else(|| StorageError::MissingColumn(column.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| {
            StorageError::Decode {
                column: column.to_string(),
                source,
            }
            .into()
        })
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Decode the single row a statement must return.
pub(crate) fn single_row(rows: Vec<Record>, statement: &str) -> Result<Record> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        _ => Err(StorageError::UnexpectedResult(format!(
            "{statement} returned {count} rows, expected 1"
        ))
        .into()),
    }
}

/// Which store implementation to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Ephemeral in-memory graph.
    Memory,
    /// In-memory graph persisted to a JSONL snapshot.
    Jsonl(PathBuf),
}

impl StoreBackend {
    /// Snapshot path, if the backend persists.
    #[must_use]
    pub fn data_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Jsonl(path) => Some(path),
            Self::Memory => None,
        }
    }
}

/// Create and connect a store.
///
/// # Errors
///
/// Returns an error if connecting fails, for example when the snapshot file
/// cannot be read.
pub async fn open_store(
    backend: StoreBackend,
    acquire_timeout: Duration,
) -> Result<Arc<dyn GraphStore>> {
    let store = match backend {
        StoreBackend::Memory => MemoryGraphStore::ephemeral(),
        StoreBackend::Jsonl(path) => MemoryGraphStore::with_snapshot(path),
    }
    .with_acquire_timeout(acquire_timeout);

    store.connect().await?;
    Ok(Arc::new(store))
}
