//! Integration tests for the VOGUE storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vogue-integration-tests
//! ```
//!
//! Everything runs in-process against [`MemoryStore`] and
//! [`MemoryProfileStore`]; no Firestore project is needed.
//!
//! # Test Categories
//!
//! - `cart_reconciliation` - Sanitizer and merger properties
//! - `cart_session` - Line-item operations and device persistence
//! - `profile_sync` - Sign-in merge, outbox pushes and checkout
//! - `catalog` - Catalog file, filters and seeding

use std::sync::Arc;

use serde_json::Value;

use vogue_core::{LineItem, Product, ProductId, UserId};
use vogue_storefront::notify::RecordingNotifier;
use vogue_storefront::profile::{MemoryProfileStore, ProfileStore};
use vogue_storefront::session::CartSession;
use vogue_storefront::storage::{LocalCartStore, MemoryStore};
use vogue_storefront::sync::{ProfileSync, SyncOutbox};

/// A session over in-memory backends, with handles to inspect them.
pub struct Harness {
    pub store: MemoryStore,
    pub profiles: MemoryProfileStore,
    pub notifier: RecordingNotifier,
    pub sync: ProfileSync<MemoryProfileStore>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        let profiles = MemoryProfileStore::new();
        Self {
            store: MemoryStore::new(),
            sync: ProfileSync::new(profiles.clone()),
            profiles,
            notifier: RecordingNotifier::new(),
        }
    }

    /// Open a session on the device store, without cloud sync.
    #[must_use]
    pub fn open(&self) -> CartSession<MemoryStore> {
        CartSession::open(LocalCartStore::new(
            self.store.clone(),
            Arc::new(self.notifier.clone()),
        ))
    }

    /// Open a session whose pushes go through a sync outbox.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn open_synced(&self) -> CartSession<MemoryStore> {
        self.open().with_outbox(SyncOutbox::spawn(self.sync.clone()))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a product from JSON.
///
/// # Panics
///
/// Panics if `value` is not a product.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(value: Value) -> Product {
    serde_json::from_value(value).expect("valid product fixture")
}

/// A line item with the given variant and quantity.
#[must_use]
pub fn line(id: i64, size: &str, color: &str, quantity: u32) -> LineItem {
    LineItem {
        id: ProductId::from(id),
        name: format!("Product {id}"),
        price: vogue_core::Price::from_units(100),
        image: None,
        selected_size: Some(size.to_string()),
        selected_color: Some(color.to_string()),
        quantity,
        extra: serde_json::Map::new(),
    }
}

/// Whether the profile store holds a document for `user`.
pub async fn has_profile<P: ProfileStore>(store: &P, user: &UserId) -> bool {
    store.profile_exists(user).await.unwrap_or(false)
}
