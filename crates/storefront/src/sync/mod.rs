//! Cart and wishlist sync with the remote profile.
//!
//! [`ProfileSync`] wraps a [`ProfileStore`] with the cart core's error policy:
//! pushes never fail the caller, pulls degrade to "use local data". The
//! [`SyncOutbox`] runs pushes off the caller's path.

mod outbox;

pub use outbox::SyncOutbox;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use vogue_core::UserId;

use crate::profile::{AuthenticatedUser, ProfileField, ProfileStore, ProfileStoreError, UserProfile};

/// Result of pulling a profile.
#[derive(Debug)]
pub enum PullOutcome {
    /// The profile exists.
    Found(UserProfile),
    /// No profile document yet.
    NotFound,
    /// The store could not be read; continue with local data.
    Failed(ProfileStoreError),
}

/// Push and pull of profile fields.
#[derive(Debug, Clone)]
pub struct ProfileSync<P> {
    store: P,
}

impl<P: ProfileStore> ProfileSync<P> {
    /// Wrap a profile store.
    pub const fn new(store: P) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &P {
        &self.store
    }

    /// Overwrite one field of the user's profile. Returns whether the write
    /// went through; failures are logged and dropped.
    #[instrument(skip(self, value), fields(user_id = %user, field = %field))]
    pub async fn push(&self, user: &UserId, field: ProfileField, value: &Value) -> bool {
        match self.store.update_field(user, field, value).await {
            Ok(()) => {
                debug!("Pushed profile field");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to push profile field");
                false
            }
        }
    }

    /// Read the user's whole profile.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn pull(&self, user: &UserId) -> PullOutcome {
        match self.store.fetch_profile(user).await {
            Ok(Some(profile)) => {
                debug!(
                    cart_items = profile.cart.len(),
                    wishlist_items = profile.wishlist.len(),
                    "Pulled profile"
                );
                PullOutcome::Found(profile)
            }
            Ok(None) => PullOutcome::NotFound,
            Err(e) => {
                warn!(error = %e, "Failed to pull profile, continuing with local data");
                PullOutcome::Failed(e)
            }
        }
    }

    /// Create the user's profile on first sign-in. Returns whether a profile
    /// exists afterwards.
    #[instrument(skip(self), fields(user_id = %user.id))]
    pub async fn ensure_profile(&self, user: &AuthenticatedUser) -> bool {
        match self.store.profile_exists(&user.id).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Failed to check for profile");
                return false;
            }
        }

        match self.store.create_profile(user).await {
            Ok(()) => {
                info!("Created profile");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to create profile");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::profile::MemoryProfileStore;

    #[tokio::test]
    async fn test_push_touches_only_named_field() {
        let store = MemoryProfileStore::new();
        let sync = ProfileSync::new(store.clone());
        let user = AuthenticatedUser::new("uid-1");
        assert!(sync.ensure_profile(&user).await);

        let cart = json!([{"id": 1, "name": "Coat", "price": 5}]);
        assert!(sync.push(&user.id, ProfileField::Cart, &cart).await);

        let doc = store.document(&user.id).unwrap();
        assert_eq!(doc.get("wishlist"), Some(&json!([])));
        assert_eq!(doc.get("cart").and_then(Value::as_array).map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_push_failure_is_swallowed() {
        let store = MemoryProfileStore::new();
        let sync = ProfileSync::new(store.clone());
        // No profile yet
        assert!(!sync.push(&UserId::new("uid-1"), ProfileField::Cart, &json!([])).await);

        store.set_fail_writes(true);
        assert!(!sync.ensure_profile(&AuthenticatedUser::new("uid-1")).await);
    }

    #[tokio::test]
    async fn test_pull_outcomes() {
        let store = MemoryProfileStore::new();
        let sync = ProfileSync::new(store.clone());
        let user = AuthenticatedUser::new("uid-1");

        assert!(matches!(sync.pull(&user.id).await, PullOutcome::NotFound));
        sync.ensure_profile(&user).await;
        assert!(matches!(sync.pull(&user.id).await, PullOutcome::Found(_)));
        store.set_fail_reads(true);
        assert!(matches!(sync.pull(&user.id).await, PullOutcome::Failed(_)));
    }
}
