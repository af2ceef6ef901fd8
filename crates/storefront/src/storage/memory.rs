//! In-process key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{KeyValueStore, StorageError, validate_key};

/// Key-value store held in memory.
///
/// Clones share the same contents, so a test can keep a handle to a store
/// after moving a clone into a [`LocalCartStore`](super::LocalCartStore).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota: Option<u64>,
    unavailable: bool,
}

impl MemoryStore {
    /// An empty store with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that rejects writes growing it past `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: u64) -> Self {
        let store = Self::default();
        store.lock().quota = Some(quota);
        store
    }

    /// Make every operation fail with [`StorageError::Unavailable`], or
    /// restore normal operation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Change the byte quota.
    pub fn set_quota(&self, quota: Option<u64>) {
        self.lock().quota = quota;
    }

    /// Stored value, bypassing availability checks.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Write a value directly, bypassing quota and availability checks.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    /// Bytes used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.lock().used_bytes(None)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryInner {
    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(())
    }

    fn used_bytes(&self, except: Option<&str>) -> u64 {
        self.entries
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != except)
            .map(|(key, value)| (key.len() + value.len()) as u64)
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.lock();
        inner.check_available()?;
        if let Some(quota) = inner.quota {
            let needed = inner.used_bytes(Some(key)) + (key.len() + value.len()) as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.lock();
        inner.check_available()?;
        inner.entries.remove(key);
        Ok(())
    }
}
