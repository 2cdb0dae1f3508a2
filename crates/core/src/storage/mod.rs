//! Persisted local state.
//!
//! Everything the tool remembers between runs (bookmarks, settings, caches)
//! lives in a flat key→value store holding JSON strings.

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Well-known keys.
pub mod keys {
    pub const RECORDS: &str = "records";
    pub const CUSTOM_PATTERNS: &str = "custom_patterns";
    pub const CLIENT_SETTINGS: &str = "client_settings";
    pub const THEME: &str = "theme";
    pub const RULE_SOURCES_CACHE: &str = "rule_sources_cache";
    pub const SEARCH_HISTORY: &str = "search_history";
}

/// Errors for key→value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for key→value persistence.
pub trait KvStore: Send + Sync {
    /// Read a raw value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a raw value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// JSON helpers on top of any `KvStore`.
pub trait KvStoreExt {
    /// Read and deserialize a value.
    ///
    /// A value that no longer deserializes reads as absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    /// Like `get_json`, but an unreadable value is a `Serialization` error.
    fn try_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    /// Serialize and store a value.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError>;
}

impl<S: KvStore + ?Sized> KvStoreExt for S {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring unreadable stored value");
                Ok(None)
            }
        }
    }

    fn try_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(key, &raw)
    }
}
