//! Durable client-local storage for the Memoria client.
//!
//! Two storage surfaces live here:
//! - a small key-value store holding the bearer token (the single source of
//!   truth for the Authorization header), and
//! - a keyed blob store for arbitrary file content, split into a documents
//!   and a cache area.
//!
//! Both are backed by pluggable backends: an on-disk implementation for real
//! clients, an in-memory one for tests, and a null backend for contexts where
//! no durable storage exists (server-side rendering). The token store is
//! deliberately forgiving: when its backend is unavailable it degrades to a
//! no-op instead of failing the caller.

mod blobs;
mod file;
mod keys;
mod memory;
mod null;
mod token;
mod traits;

pub use blobs::{BlobArea, BlobInfo, BlobStore, DiskBlobStore, MemoryBlobStore};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use null::UnavailableStorage;
pub use token::TokenStore;
pub use traits::KeyValueStorage;

use std::path::PathBuf;
use thiserror::Error;

/// Directory name under the platform data dir holding client storage.
const APP_DIR_NAME: &str = "memoria";

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Key or blob not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No durable storage is available in this context
    #[error("Storage unavailable")]
    Unavailable,

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Default storage root (`<data dir>/memoria`), when one exists.
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR_NAME))
}

/// Create the default key-value storage backend for this context.
///
/// Falls back to the null backend when no platform data directory exists, so
/// callers never have to special-case storage-less environments.
pub fn create_storage() -> Box<dyn KeyValueStorage> {
    match default_storage_dir() {
        Some(dir) => Box::new(FileStorage::new(dir.join("kv.json"))),
        None => Box::new(UnavailableStorage),
    }
}

/// Create a TokenStore over the default backend.
pub fn create_token_store() -> TokenStore {
    TokenStore::new(create_storage())
}
