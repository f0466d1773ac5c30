//! Repository configuration.
//!
//! A constellation repository is any directory containing `.constellation/`.
//! Its `config.yaml` selects the store backend and analysis defaults:
//!
//! ```yaml
//! store:
//!   backend: jsonl
//!   data-file: .constellation/graph.jsonl
//!   acquire-timeout-ms: 5000
//! analysis:
//!   default-max-depth: 3
//! ```

use crate::analysis::{clamp_depth, DEFAULT_MAX_DEPTH};
use crate::error::{ConfigError, Result};
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the repository metadata directory.
pub const CONSTELLATION_DIR_NAME: &str = ".constellation";

/// Name of the configuration file inside the metadata directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the graph snapshot inside the metadata directory.
pub const GRAPH_FILE_NAME: &str = "graph.jsonl";

/// Default store lock acquisition timeout in milliseconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

/// Maximum directory depth to climb when searching for a repository root.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstellationConfig {
    /// Store settings.
    pub store: StoreConfig,

    /// Analysis defaults.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Which store implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ephemeral in-memory graph.
    Memory,
    /// In-memory graph persisted to a JSONL snapshot.
    #[default]
    Jsonl,
}

/// `store:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Backend kind.
    pub backend: BackendKind,

    /// Snapshot path, relative to the repository root.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Store lock acquisition timeout in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_data_file() -> String {
    format!("{CONSTELLATION_DIR_NAME}/{GRAPH_FILE_NAME}")
}

fn default_acquire_timeout_ms() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_file: default_data_file(),
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }
}

/// `analysis:` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Traversal depth when a command gives none; clamped to [1, 5].
    #[serde(default = "default_max_depth")]
    pub default_max_depth: u32,
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConstellationConfig {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid YAML, or holds
    /// out-of-range values.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config file.
    ///
    /// # Errors
    ///
    /// Fails if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Reject values no store could work with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.store.acquire_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.acquire-timeout-ms must be greater than 0".to_string(),
            ));
        }
        if self.store.backend == BackendKind::Jsonl && self.store.data_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.data-file must be set for the jsonl backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the store backend against the repository root.
    #[must_use]
    pub fn backend(&self, root: &Path) -> StoreBackend {
        match self.store.backend {
            BackendKind::Memory => StoreBackend::Memory,
            BackendKind::Jsonl => StoreBackend::Jsonl(root.join(&self.store.data_file)),
        }
    }

    /// Store lock acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.store.acquire_timeout_ms)
    }

    /// Default traversal depth, clamped.
    #[must_use]
    pub fn default_max_depth(&self) -> u32 {
        clamp_depth(self.analysis.default_max_depth)
    }
}

/// Find the repository root by searching up from `start_dir`.
///
/// Returns the directory that contains `.constellation/`.
pub fn find_constellation_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(CONSTELLATION_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
