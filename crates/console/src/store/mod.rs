//! Persisted key-value storage for demo data.
//!
//! Each key holds one JSON document. Two backends are provided:
//!
//! - [`FileStore`] - one file per key under a data directory
//! - [`MemoryStore`] - process-local map, used in tests and ephemeral sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur in a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that are not allowed.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Named string slots holding JSON blobs.
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `None` when it was never written or has been removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a single key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write several keys together.
    ///
    /// Backends that can stage writes override this to write every entry
    /// before any becomes visible. This is best-effort: a failure while
    /// publishing staged entries can still leave earlier ones applied.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any entry cannot be written.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Keys are restricted so they map safely onto file names.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
