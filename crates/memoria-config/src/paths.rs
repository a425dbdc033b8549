//! File system paths for the client core.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for client-side state.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client runtime files (~/.memoria)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.memoria`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".memoria"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.memoria).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.memoria/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the key-value store path (~/.memoria/kv.json).
    pub fn kv_file(&self) -> PathBuf {
        self.base_dir.join("kv.json")
    }

    /// Get the blob storage root (~/.memoria/blobs).
    pub fn blobs_dir(&self) -> PathBuf {
        self.base_dir.join("blobs")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.blobs_dir())?;
        Ok(())
    }
}
