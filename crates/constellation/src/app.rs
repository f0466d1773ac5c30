//! Application facade.
//!
//! [`App`] owns the single store handle for a process and hands out the
//! registries and analysis engine that share it.
//!
//! # Example
//!
//! ```no_run
//! use constellation::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{} CIs", app.assets().count().await?);
//!     app.close().await?;
//!     Ok(())
//! }
//! ```

use crate::analysis::AnalysisEngine;
use crate::config::{find_constellation_root, ConstellationConfig, CONFIG_FILE_NAME, CONSTELLATION_DIR_NAME};
use crate::domain::{NewCi, RelationshipRequest};
use crate::error::{ConfigError, Result};
use crate::registry::{AssetRegistry, CiCreationReport, RelationshipRegistry};
use crate::store::{open_store, GraphStore, StoreBackend, DEFAULT_ACQUIRE_TIMEOUT};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the store handle and the components built on it.
pub struct App {
    store: Arc<dyn GraphStore>,
    assets: AssetRegistry,
    relationships: RelationshipRegistry,
    analysis: AnalysisEngine,
    root: Option<PathBuf>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("analysis", &self.analysis)
            .field("store", &"<dyn GraphStore>")
            .finish()
    }
}

impl App {
    /// Wrap an already connected store.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            assets: AssetRegistry::new(Arc::clone(&store)),
            relationships: RelationshipRegistry::new(Arc::clone(&store)),
            analysis: AnalysisEngine::new(Arc::clone(&store)),
            store,
            root: None,
        }
    }

    /// Open a fresh ephemeral in-memory graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to connect.
    pub async fn in_memory() -> Result<Self> {
        let store = open_store(StoreBackend::Memory, DEFAULT_ACQUIRE_TIMEOUT).await?;
        Ok(Self::new(store))
    }

    /// Open the store described by `config` for the repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to connect.
    pub async fn open(config: &ConstellationConfig, root: &Path) -> Result<Self> {
        let store = open_store(config.backend(root), config.acquire_timeout()).await?;
        let mut app = Self::new(store);
        app.analysis = app.analysis.with_default_depth(config.default_max_depth());
        app.root = Some(root.to_path_buf());
        Ok(app)
    }

    /// Find the repository above `working_dir`, load its config and open it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotInitialized`] if no `.constellation/` is found
    /// - config load or store connection failures
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_constellation_root(working_dir)
            .ok_or_else(|| ConfigError::NotInitialized(working_dir.to_path_buf()))?;
        let config_path = root.join(CONSTELLATION_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = ConstellationConfig::load(&config_path).await?;
        tracing::debug!(root = %root.display(), backend = ?config.store.backend, "Opening repository");
        Self::open(&config, &root).await
    }

    /// Disconnect the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to disconnect cleanly.
    pub async fn close(&self) -> Result<()> {
        self.store.disconnect().await
    }

    /// The asset registry.
    #[must_use]
    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// The relationship registry.
    #[must_use]
    pub fn relationships(&self) -> &RelationshipRegistry {
        &self.relationships
    }

    /// The analysis engine.
    #[must_use]
    pub fn analysis(&self) -> &AnalysisEngine {
        &self.analysis
    }

    /// The shared store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Repository root, when opened from a directory.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Create a CI and its outgoing relationships, best effort.
    ///
    /// # Errors
    ///
    /// See [`AssetRegistry::create_with_relationships`].
    pub async fn create_ci_with_relationships(
        &self,
        new: NewCi,
        requests: Vec<RelationshipRequest>,
    ) -> Result<CiCreationReport> {
        self.assets.create_with_relationships(new, requests).await
    }
}
