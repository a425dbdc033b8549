//! On-disk key-value storage.

use crate::{KeyValueStorage, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// File-backed storage: one JSON object per store, rewritten on every write.
///
/// The store is tiny (a handful of keys) so read-modify-write of the whole
/// file is fine. A process-wide mutex serializes writers within this process.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a storage over the given file. The file and its parent
    /// directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(path: &Path) -> StorageResult<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_map(path: &Path, map: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().unwrap();
        let mut map = Self::read_map(&self.path)?;
        map.insert(key.to_string(), value.to_string());
        Self::write_map(&self.path, &map)?;
        debug!(key = %key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        let map = Self::read_map(&self.path)?;
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().unwrap();
        let mut map = Self::read_map(&self.path)?;
        let existed = map.remove(key).is_some();
        if existed {
            Self::write_map(&self.path, &map)?;
        }
        Ok(existed)
    }
}
