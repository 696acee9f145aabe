//! Archive location and cache configuration.

use std::path::{Path, PathBuf};

use aus400_common::GridId;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Where the archive lives and how much of it to keep in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive root holding `catalogue.csv`, `variables.csv` and `grids/`
    pub root: PathBuf,
    /// Maximum number of weights tables kept in memory
    pub weights_cache_entries: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/g/data/ia89/aus400"),
            weights_cache_entries: 8,
        }
    }
}

impl ArchiveConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AUS400_ROOT") {
            config.root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("AUS400_WEIGHTS_CACHE") {
            if let Ok(n) = val.parse() {
                config.weights_cache_entries = n;
            }
        }

        config
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> StorageResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> StorageResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate().map_err(StorageError::Config)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("root must not be empty".to_string());
        }

        if self.weights_cache_entries == 0 {
            return Err("weights_cache_entries must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn catalogue_path(&self) -> PathBuf {
        self.root.join("catalogue.csv")
    }

    pub fn variables_path(&self) -> PathBuf {
        self.root.join("variables.csv")
    }

    /// File name of the weights from `source` to `target`.
    pub fn weights_file_name(source: &GridId, target: &str) -> String {
        format!("weights_{}_to_{}.nc", source, target)
    }

    pub fn weights_path(&self, source: &GridId, target: &str) -> PathBuf {
        self.root
            .join("grids")
            .join(Self::weights_file_name(source, target))
    }
}
