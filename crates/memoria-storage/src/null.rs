//! Null backend for storage-less contexts.

use crate::{KeyValueStorage, StorageError, StorageResult};

/// Backend used where no durable storage exists (e.g. server-side rendering).
///
/// Reads report nothing stored; writes report [`StorageError::Unavailable`]
/// so callers can decide whether that matters. The [`crate::TokenStore`]
/// swallows these.
pub struct UnavailableStorage;

impl KeyValueStorage for UnavailableStorage {
    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable)
    }

    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn delete(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_empty_writes_fail() {
        let storage = UnavailableStorage;
        assert_eq!(storage.get("anything").unwrap(), None);
        assert!(!storage.has("anything").unwrap());
        assert!(matches!(
            storage.set("k", "v"),
            Err(StorageError::Unavailable)
        ));
        assert!(matches!(storage.delete("k"), Err(StorageError::Unavailable)));
    }
}
