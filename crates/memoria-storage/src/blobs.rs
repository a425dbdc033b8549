//! Keyed blob storage for arbitrary file content.
//!
//! Unrelated to session state, but shares the platform split: native shells
//! write real files under documents/cache directories, while other contexts
//! use the in-memory backend.

use crate::{StorageError, StorageResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Which storage area a blob lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobArea {
    /// Long-lived user content.
    Documents,
    /// Reclaimable cached content.
    Cache,
}

impl BlobArea {
    fn dir_name(&self) -> &'static str {
        match self {
            BlobArea::Documents => "documents",
            BlobArea::Cache => "cache",
        }
    }
}

/// Metadata about a stored blob.
#[derive(Debug, Clone)]
pub struct BlobInfo {
    /// Blob name (the key it was saved under).
    pub name: String,
    /// Size in bytes, when known.
    pub size: Option<u64>,
}

/// Trait for blob storage backends
pub trait BlobStore: Send + Sync {
    /// Save a blob, replacing any existing one with the same name
    fn save(&self, area: BlobArea, name: &str, content: &str) -> StorageResult<()>;

    /// Read a blob's content
    fn read(&self, area: BlobArea, name: &str) -> StorageResult<String>;

    /// Delete a blob, returning whether it existed
    fn delete(&self, area: BlobArea, name: &str) -> StorageResult<bool>;

    /// List blobs in an area
    fn list(&self, area: BlobArea) -> StorageResult<Vec<BlobInfo>>;

    /// Delete every blob in an area
    fn clear_all(&self, area: BlobArea) -> StorageResult<()> {
        for info in self.list(area)? {
            self.delete(area, &info.name)?;
        }
        Ok(())
    }
}

/// Blob store writing real files under a root directory.
pub struct DiskBlobStore {
    root: PathBuf,
}

impl DiskBlobStore {
    /// Create a blob store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn area_dir(&self, area: BlobArea) -> PathBuf {
        self.root.join(area.dir_name())
    }

    fn blob_path(&self, area: BlobArea, name: &str) -> StorageResult<PathBuf> {
        // Names are keys, not paths; reject separators outright.
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StorageError::Backend(format!("Invalid blob name: {name}")));
        }
        Ok(self.area_dir(area).join(name))
    }
}

impl BlobStore for DiskBlobStore {
    fn save(&self, area: BlobArea, name: &str, content: &str) -> StorageResult<()> {
        let path = self.blob_path(area, name)?;
        std::fs::create_dir_all(self.area_dir(area))?;
        std::fs::write(&path, content)?;
        debug!(name = %name, area = ?area, "Blob saved");
        Ok(())
    }

    fn read(&self, area: BlobArea, name: &str) -> StorageResult<String> {
        let path = self.blob_path(area, name)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, area: BlobArea, name: &str) -> StorageResult<bool> {
        let path = self.blob_path(area, name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(name = %name, area = ?area, "Blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, area: BlobArea) -> StorageResult<Vec<BlobInfo>> {
        let dir = self.area_dir(area);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut blobs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                Err(raw) => {
                    warn!(raw = ?raw, "Skipping blob with non-UTF8 name");
                    continue;
                }
            };
            let size = entry.metadata().ok().map(|m| m.len());
            blobs.push(BlobInfo { name, size });
        }
        Ok(blobs)
    }
}

/// In-memory blob store for tests and storage-less contexts.
#[derive(Default)]
pub struct MemoryBlobStore {
    areas: Mutex<HashMap<BlobArea, HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, area: BlobArea, name: &str, content: &str) -> StorageResult<()> {
        let mut areas = self.areas.lock().unwrap();
        areas
            .entry(area)
            .or_default()
            .insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn read(&self, area: BlobArea, name: &str) -> StorageResult<String> {
        let areas = self.areas.lock().unwrap();
        areas
            .get(&area)
            .and_then(|blobs| blobs.get(name))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn delete(&self, area: BlobArea, name: &str) -> StorageResult<bool> {
        let mut areas = self.areas.lock().unwrap();
        Ok(areas
            .get_mut(&area)
            .map(|blobs| blobs.remove(name).is_some())
            .unwrap_or(false))
    }

    fn list(&self, area: BlobArea) -> StorageResult<Vec<BlobInfo>> {
        let areas = self.areas.lock().unwrap();
        Ok(areas
            .get(&area)
            .map(|blobs| {
                blobs
                    .iter()
                    .map(|(name, content)| BlobInfo {
                        name: name.clone(),
                        size: Some(content.len() as u64),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
