//! Bearer token persistence.

use crate::{KeyValueStorage, StorageKeys, UnavailableStorage};
use tracing::{debug, warn};

/// Persists the single bearer token under one fixed key.
///
/// This is the source of truth for the Authorization header across process
/// restarts. It must be usable before anything else is initialized and must
/// not fail in storage-less contexts: backend errors on write are logged and
/// swallowed, and reads degrade to `None`.
pub struct TokenStore {
    storage: Box<dyn KeyValueStorage>,
}

impl TokenStore {
    /// Create a token store over the given backend.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Create a token store that never persists anything.
    pub fn unavailable() -> Self {
        Self::new(Box::new(UnavailableStorage))
    }

    /// Persist the token. A no-op when the backend is unavailable.
    pub fn store(&self, token: &str) {
        match self.storage.set(StorageKeys::AUTH_TOKEN, token) {
            Ok(()) => debug!("Bearer token persisted"),
            Err(e) => debug!(error = %e, "Skipping token persistence"),
        }
    }

    /// Remove the persisted token. A no-op when the backend is unavailable.
    pub fn clear(&self) {
        match self.storage.delete(StorageKeys::AUTH_TOKEN) {
            Ok(true) => debug!("Bearer token cleared"),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "Skipping token clear"),
        }
    }

    /// Read the persisted token, if any.
    pub fn read(&self) -> Option<String> {
        match self.storage.get(StorageKeys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Token read failed, treating as absent");
                None
            }
        }
    }

    /// Whether a token is currently persisted.
    pub fn has_token(&self) -> bool {
        self.read().is_some()
    }
}
