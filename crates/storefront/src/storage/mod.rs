//! Per-device key-value storage.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the slot abstraction: whole-value string writes,
//!   last writer wins
//! - [`FileStore`] keeps one JSON file per key under a data directory
//! - [`MemoryStore`] lives in process memory and can simulate a full or
//!   unavailable backend
//! - [`LocalCartStore`] layers the cart, wishlist and display preference on
//!   top of any store and never fails a read

mod file;
mod local;
mod memory;

pub use file::FileStore;
pub use local::{CART_KEY, DARK_MODE_KEY, LoadReport, LocalCartStore, WISHLIST_KEY};
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when reading or writing a store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refuses access (e.g. restricted private mode).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Writing would exceed the byte quota.
    #[error("Storage quota exceeded: need {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Bytes in use after the write.
        needed: u64,
        /// Allowed bytes.
        quota: u64,
    },

    /// Key is empty or contains characters a backend cannot store.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A persistent string slot per key.
pub trait KeyValueStore: Send {
    /// Read a key. `Ok(None)` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value of a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the delete.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Check that a key is non-empty ASCII alphanumeric, `_` or `-`.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cart").is_ok());
        assert!(validate_key("darkMode").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../cart").is_err());
        assert!(validate_key("cart.json").is_err());
    }
}
