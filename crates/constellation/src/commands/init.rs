//! Implementation of the `init` command.
//!
//! Creates the `.constellation/` directory with a default configuration and,
//! for the jsonl backend, an empty graph snapshot.

use crate::config::{
    BackendKind, ConstellationConfig, StoreConfig, CONFIG_FILE_NAME, CONSTELLATION_DIR_NAME,
};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within `.constellation`.
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

const GITIGNORE_CONTENT: &str = "\
# Leftovers from interrupted snapshot writes
*.tmp
";

/// Paths created by [`init`].
#[derive(Debug)]
pub struct InitResult {
    /// The `.constellation` directory.
    pub constellation_dir: PathBuf,
    /// The config file.
    pub config_file: PathBuf,
    /// The graph snapshot, for the jsonl backend.
    pub data_file: Option<PathBuf>,
    /// The gitignore file.
    pub gitignore_file: PathBuf,
}

/// Initialize a new repository in `base_dir`.
///
/// # Errors
///
/// - [`ConfigError::AlreadyInitialized`] if `.constellation/` exists
/// - IO errors from creating files
pub async fn init(base_dir: &Path, backend: BackendKind) -> Result<InitResult> {
    let constellation_dir = base_dir.join(CONSTELLATION_DIR_NAME);
    if constellation_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(constellation_dir).into());
    }

    fs::create_dir_all(&constellation_dir).await?;

    let config = ConstellationConfig {
        store: StoreConfig {
            backend,
            ..StoreConfig::default()
        },
        ..ConstellationConfig::default()
    };
    let config_file = constellation_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let data_file = match backend {
        BackendKind::Jsonl => {
            let path = base_dir.join(&config.store.data_file);
            fs::write(&path, "").await?;
            Some(path)
        }
        BackendKind::Memory => None,
    };

    let gitignore_file = constellation_dir.join(GITIGNORE_FILE_NAME);
    fs::write(&gitignore_file, GITIGNORE_CONTENT).await?;

    tracing::info!(path = %constellation_dir.display(), ?backend, "Initialized constellation repository");

    Ok(InitResult {
        constellation_dir,
        config_file,
        data_file,
        gitignore_file,
    })
}

/// Whether `base_dir` contains `.constellation/`.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(CONSTELLATION_DIR_NAME).is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_layout() {
        let dir = TempDir::new().unwrap();
        let result = init(dir.path(), BackendKind::Jsonl).await.unwrap();

        assert!(result.constellation_dir.is_dir());
        assert!(result.config_file.is_file());
        assert!(result.gitignore_file.is_file());
        let data_file = result.data_file.unwrap();
        assert!(data_file.ends_with(".constellation/graph.jsonl"));
        assert_eq!(std::fs::metadata(&data_file).unwrap().len(), 0);
        assert!(is_initialized(dir.path()));

        let config = ConstellationConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.store.backend, BackendKind::Jsonl);
    }

    #[tokio::test]
    async fn memory_backend_creates_no_snapshot() {
        let dir = TempDir::new().unwrap();
        let result = init(dir.path(), BackendKind::Memory).await.unwrap();
        assert!(result.data_file.is_none());
    }

    #[tokio::test]
    async fn second_init_fails() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), BackendKind::Jsonl).await.unwrap();

        let err = init(dir.path(), BackendKind::Jsonl).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::AlreadyInitialized(_))));
    }
}
