//! In-memory graph store backed by petgraph.
//!
//! The whole graph lives in a [`GraphState`] behind a `tokio::sync::Mutex`.
//! Statements hold the lock for their full duration, which makes each write
//! atomic with respect to every other statement.
//!
//! When created with a snapshot path the store loads the JSONL snapshot on
//! [`connect`](GraphStore::connect) and rewrites it after each write that
//! changed the graph. If that rewrite fails, the graph is reloaded from the
//! untouched snapshot so memory and disk agree, and the write reports
//! `StoreUnavailable`.

mod read;
mod snapshot;
mod state;
mod write;

pub use snapshot::LoadWarning;

use super::{GraphStore, ReadQuery, Record, WriteQuery, DEFAULT_ACQUIRE_TIMEOUT};
use crate::error::{Error, Result};
use async_trait::async_trait;
use state::GraphState;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Graph store holding everything in memory, optionally snapshotted to JSONL.
#[derive(Debug)]
pub struct MemoryGraphStore {
    state: Mutex<GraphState>,
    connected: AtomicBool,
    snapshot_path: Option<PathBuf>,
    acquire_timeout: Duration,
}

impl MemoryGraphStore {
    /// A store that keeps nothing after disconnect.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            state: Mutex::new(GraphState::new()),
            connected: AtomicBool::new(false),
            snapshot_path: None,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// A store persisted to the JSONL snapshot at `path`.
    ///
    /// The file need not exist yet; it is created by the first write.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(path.into()),
            ..Self::ephemeral()
        }
    }

    /// Set how long statements wait for the store lock.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// The snapshot path, if any.
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::StoreUnavailable("graph store is not connected".to_string()))
        }
    }

    /// Acquire the state lock for a statement.
    ///
    /// The connection flag is checked again once the lock is held: a failed
    /// persist or a disconnect may have dropped the graph while this
    /// statement was queued.
    async fn acquire_connected(&self) -> Result<MutexGuard<'_, GraphState>> {
        self.ensure_connected()?;
        let state = self.acquire().await?;
        self.ensure_connected()?;
        Ok(state)
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, GraphState>> {
        tokio::time::timeout(self.acquire_timeout, self.state.lock())
            .await
            .map_err(|_| {
                Error::StoreUnavailable(format!(
                    "timed out after {}ms waiting for the graph store",
                    self.acquire_timeout.as_millis()
                ))
            })
    }

    async fn load_snapshot(path: &Path) -> Result<GraphState> {
        let (state, warnings) = snapshot::load(path).await?;
        for warning in &warnings {
            tracing::warn!(path = %path.display(), "Snapshot load: {warning}");
        }
        tracing::debug!(
            path = %path.display(),
            cis = state.ci_count(),
            relationships = state.relationship_count(),
            warnings = warnings.len(),
            "Loaded graph snapshot"
        );
        Ok(state)
    }

    /// Persist after a changing write; on failure restore from disk.
    async fn persist(&self, state: &mut GraphState, statement: &str) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let Err(save_error) = snapshot::save(path, state).await else {
            return Ok(());
        };

        tracing::warn!(statement, error = %save_error, "Snapshot write failed, reloading graph from disk");
        match Self::load_snapshot(path).await {
            Ok(restored) => {
                *state = restored;
                Err(Error::StoreUnavailable(format!(
                    "failed to persist {statement}: {save_error}"
                )))
            }
            Err(reload_error) => {
                *state = GraphState::new();
                self.connected.store(false, Ordering::SeqCst);
                tracing::error!(error = %reload_error, "Snapshot reload failed, disconnecting graph store");
                Err(Error::StoreUnavailable(format!(
                    "failed to persist {statement}: {save_error}; reload failed: {reload_error}"
                )))
            }
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        let mut state = self.acquire().await?;
        if let Some(path) = &self.snapshot_path {
            *state = Self::load_snapshot(path).await?;
        }
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Graph store connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }
        let mut state = self.acquire().await?;
        if self.snapshot_path.is_some() {
            *state = GraphState::new();
        }
        // Flipped under the lock; queued statements see it when they acquire.
        self.connected.store(false, Ordering::SeqCst);
        drop(state);
        tracing::debug!("Graph store disconnected");
        Ok(())
    }

    async fn verify_connectivity(&self) -> Result<()> {
        let rows = self.execute_query(ReadQuery::Ping).await?;
        super::single_row(rows, "ping").map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn execute_query(&self, query: ReadQuery) -> Result<Vec<Record>> {
        tracing::trace!(?query, "Executing read");
        let state = self.acquire_connected().await?;
        read::execute(&state, query)
    }

    async fn execute_write_query(&self, query: WriteQuery) -> Result<Vec<Record>> {
        let statement = query.name();
        tracing::debug!(statement, "Executing write");
        let mut state = self.acquire_connected().await?;
        let outcome = write::execute(&mut state, query)?;
        if outcome.changed {
            self.persist(&mut state, statement).await?;
        }
        Ok(outcome.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiId, NewCi};
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create(name: &str) -> WriteQuery {
        WriteQuery::CreateCi {
            ci: NewCi::new(name).into_ci(Utc::now()),
        }
    }

    #[tokio::test]
    async fn queries_fail_fast_when_disconnected() {
        let store = MemoryGraphStore::ephemeral();
        assert!(!store.is_connected());
        assert!(matches!(
            store.execute_query(ReadQuery::Ping).await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.execute_write_query(create("x")).await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn connect_is_idempotent_and_disconnect_blocks_queries() {
        let store = MemoryGraphStore::ephemeral();
        store.connect().await.unwrap();
        store.connect().await.unwrap();
        store.verify_connectivity().await.unwrap();

        store.disconnect().await.unwrap();
        assert!(matches!(
            store.verify_connectivity().await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn lock_timeout_surfaces_store_unavailable() {
        let store = Arc::new(
            MemoryGraphStore::ephemeral().with_acquire_timeout(Duration::from_millis(20)),
        );
        store.connect().await.unwrap();

        let _held = store.state.lock().await;
        let err = store.execute_query(ReadQuery::Ping).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn snapshot_survives_reconnect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let store = MemoryGraphStore::with_snapshot(&path);
        store.connect().await.unwrap();
        store.execute_write_query(create("kept")).await.unwrap();
        store.disconnect().await.unwrap();

        let reopened = MemoryGraphStore::with_snapshot(&path);
        reopened.connect().await.unwrap();
        let rows = reopened
            .execute_query(ReadQuery::GraphCounts)
            .await
            .unwrap();
        assert_eq!(rows[0].decode::<usize>("total_cis").unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_to_disk_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let store = MemoryGraphStore::with_snapshot(&path);
        store.connect().await.unwrap();
        store.execute_write_query(create("first")).await.unwrap();

        // A directory where the temp file should go makes the rewrite fail.
        let blocker = dir.path().join("graph.jsonl.tmp");
        tokio::fs::create_dir(&blocker).await.unwrap();

        let err = store.execute_write_query(create("second")).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert!(store.is_connected());

        let rows = store.execute_query(ReadQuery::GraphCounts).await.unwrap();
        assert_eq!(rows[0].decode::<usize>("total_cis").unwrap(), 1);

        tokio::fs::remove_dir(&blocker).await.unwrap();
        store.execute_write_query(create("third")).await.unwrap();
        let rows = store.execute_query(ReadQuery::GraphCounts).await.unwrap();
        assert_eq!(rows[0].decode::<usize>("total_cis").unwrap(), 2);
    }

    #[tokio::test]
    async fn statements_queued_behind_a_lost_store_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let store = Arc::new(MemoryGraphStore::with_snapshot(&path));
        store.connect().await.unwrap();
        store.execute_write_query(create("a")).await.unwrap();
        store.execute_write_query(create("b")).await.unwrap();

        let held = store.state.lock().await;
        let writer = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.execute_write_query(create("c")).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.execute_query(ReadQuery::GraphCounts).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Neither the rewrite nor the reload can succeed.
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();
        tokio::fs::create_dir(dir.path().join("graph.jsonl.tmp"))
            .await
            .unwrap();
        drop(held);

        let write = writer.await.unwrap();
        assert!(matches!(write, Err(Error::StoreUnavailable(msg)) if msg.contains("reload failed")));
        assert!(!store.is_connected());

        let read = reader.await.unwrap();
        assert!(matches!(read, Err(Error::StoreUnavailable(_))), "got {read:?}");
    }

    #[tokio::test]
    async fn statements_queued_behind_disconnect_fail() {
        let store = Arc::new(MemoryGraphStore::ephemeral());
        store.connect().await.unwrap();

        let held = store.state.lock().await;
        let disconnecting = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.disconnect().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.execute_query(ReadQuery::Ping).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_connected());
        drop(held);

        disconnecting.await.unwrap().unwrap();
        let read = reader.await.unwrap();
        assert!(matches!(read, Err(Error::StoreUnavailable(_))), "got {read:?}");
    }

    #[tokio::test]
    async fn unchanged_write_does_not_create_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let store = MemoryGraphStore::with_snapshot(&path);
        store.connect().await.unwrap();

        store
            .execute_write_query(WriteQuery::DetachDeleteCi {
                id: CiId::new("missing"),
            })
            .await
            .unwrap();
        assert!(!path.exists());
    }
}
