//! In-process [`ProfileStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Map, Value};

use vogue_core::UserId;

use super::{AuthenticatedUser, ProfileField, ProfileStore, ProfileStoreError, UserProfile};

/// Profile store kept in memory, holding raw documents.
///
/// Clones share the same documents. Reads and writes can be made to fail
/// independently to exercise degraded paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    inner: Arc<Mutex<MemoryProfiles>>,
}

#[derive(Debug, Default)]
struct MemoryProfiles {
    documents: HashMap<UserId, Map<String, Value>>,
    writes: Vec<(UserId, ProfileField, Value)>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document, replacing any existing one.
    pub fn insert_document(&self, user: &UserId, fields: Map<String, Value>) {
        self.lock().documents.insert(user.clone(), fields);
    }

    /// Raw document of a user.
    #[must_use]
    pub fn document(&self, user: &UserId) -> Option<Map<String, Value>> {
        self.lock().documents.get(user).cloned()
    }

    /// One raw field of a user's document.
    #[must_use]
    pub fn field(&self, user: &UserId, field: ProfileField) -> Option<Value> {
        self.lock()
            .documents
            .get(user)
            .and_then(|doc| doc.get(field.as_str()).cloned())
    }

    /// Every successful field update so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<(UserId, ProfileField, Value)> {
        self.lock().writes.clone()
    }

    /// Make reads (fetch, existence checks) fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make writes (create, update) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryProfiles> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryProfiles {
    fn check_reads(&self) -> Result<(), ProfileStoreError> {
        if self.fail_reads {
            return Err(ProfileStoreError::Unavailable(
                "profile reads disabled".to_string(),
            ));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), ProfileStoreError> {
        if self.fail_writes {
            return Err(ProfileStoreError::Unavailable(
                "profile writes disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        let document = {
            let inner = self.lock();
            inner.check_reads()?;
            inner.documents.get(user).cloned()
        };
        document
            .map(UserProfile::from_fields)
            .transpose()
            .map_err(Into::into)
    }

    async fn profile_exists(&self, user: &UserId) -> Result<bool, ProfileStoreError> {
        let inner = self.lock();
        inner.check_reads()?;
        Ok(inner.documents.contains_key(user))
    }

    async fn create_profile(&self, user: &AuthenticatedUser) -> Result<(), ProfileStoreError> {
        let mut inner = self.lock();
        inner.check_writes()?;
        inner
            .documents
            .entry(user.id.clone())
            .or_insert_with(|| user.new_profile_fields(Utc::now()));
        Ok(())
    }

    async fn update_field(
        &self,
        user: &UserId,
        field: ProfileField,
        value: &Value,
    ) -> Result<(), ProfileStoreError> {
        let mut inner = self.lock();
        inner.check_writes()?;
        let document = inner
            .documents
            .get_mut(user)
            .ok_or_else(|| ProfileStoreError::NotFound(user.clone()))?;
        document.insert(field.as_str().to_string(), value.clone());
        inner.writes.push((user.clone(), field, value.clone()));
        Ok(())
    }
}
