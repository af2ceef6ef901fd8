//! Cart, wishlist and display preference on top of a [`KeyValueStore`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use vogue_core::{Cart, Wishlist, sanitize};

use super::{KeyValueStore, StorageError};
use crate::notify::{NoticeLevel, Notifier};

/// Key holding the cart as a JSON array of line items.
pub const CART_KEY: &str = "cart";
/// Key holding the wishlist as a JSON array of product ids.
pub const WISHLIST_KEY: &str = "wishlist";
/// Key holding the dark mode preference as `"true"` or `"false"`.
pub const DARK_MODE_KEY: &str = "darkMode";

/// Result of loading the cart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// The sanitized cart.
    pub cart: Cart,
    /// Stored entries that did not make it into the cart (invalid records and
    /// collapsed duplicates).
    pub discarded: usize,
}

/// Device-local persistence of the shopper's cart and wishlist.
///
/// Reads never fail: missing, corrupt or unreadable data loads as empty.
/// Failed writes are reported to the shopper and returned, but never touch the
/// caller's in-memory state.
pub struct LocalCartStore<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: KeyValueStore> LocalCartStore<S> {
    /// Wrap a store.
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// The notifier used for write failures.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Load the cart, or an empty cart if nothing usable is stored.
    #[must_use]
    pub fn load(&self) -> Cart {
        self.load_report().cart
    }

    /// Load the cart and count the entries sanitizing dropped.
    #[must_use]
    pub fn load_report(&self) -> LoadReport {
        let Some(raw) = self.read_json(CART_KEY) else {
            return LoadReport::default();
        };

        let stored = raw.as_array().map_or(0, Vec::len);
        let cart = Cart::from_items(sanitize(&raw));
        let discarded = stored.saturating_sub(cart.len());
        if discarded > 0 {
            info!(discarded, kept = cart.len(), "Discarded stored cart entries");
        }
        LoadReport { cart, discarded }
    }

    /// Persist the cart, replacing the stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails. The shopper has already been
    /// warned when this returns.
    pub fn save(&mut self, cart: &Cart) -> Result<(), StorageError> {
        self.write_json(CART_KEY, &cart.to_json()).inspect_err(|e| {
            warn!(error = %e, items = cart.len(), "Failed to save cart");
            self.notifier.notify(
                NoticeLevel::Warning,
                "Your cart could not be saved on this device. Changes may be lost when you leave.",
            );
        })
    }

    /// Delete the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the delete. A warning
    /// notice has already been sent in that case.
    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.store.remove(CART_KEY).inspect_err(|e| {
            warn!(error = %e, "Failed to clear stored cart");
            self.notifier.notify(
                NoticeLevel::Warning,
                "Your cart could not be cleared on this device. Items may reappear next time.",
            );
        })
    }

    /// Load the wishlist, or an empty one if nothing usable is stored.
    #[must_use]
    pub fn load_wishlist(&self) -> Wishlist {
        self.read_json(WISHLIST_KEY)
            .map_or_else(Wishlist::new, |raw| Wishlist::from_json(&raw))
    }

    /// Persist the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails. The shopper has already been
    /// warned when this returns.
    pub fn save_wishlist(&mut self, wishlist: &Wishlist) -> Result<(), StorageError> {
        self.write_json(WISHLIST_KEY, &wishlist.to_json())
            .inspect_err(|e| {
                warn!(error = %e, items = wishlist.len(), "Failed to save wishlist");
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Your wishlist could not be saved on this device.",
                );
            })
    }

    /// Dark mode preference; off unless stored as `"true"`.
    #[must_use]
    pub fn load_dark_mode(&self) -> bool {
        match self.store.get(DARK_MODE_KEY) {
            Ok(value) => value.as_deref().map(str::trim) == Some("true"),
            Err(e) => {
                debug!(error = %e, "Dark mode preference unreadable");
                false
            }
        }
    }

    /// Persist the dark mode preference.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub fn save_dark_mode(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.store
            .set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
            .inspect_err(|e| warn!(error = %e, "Failed to save dark mode preference"))
    }

    fn read_json(&self, key: &str) -> Option<Value> {
        let text = match self.store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Storage unreadable, using empty value");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored value is not valid JSON, using empty value");
                None
            }
        }
    }

    fn write_json(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.store.set(key, &text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    fn local(store: &MemoryStore) -> (LocalCartStore<MemoryStore>, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        (
            LocalCartStore::new(store.clone(), Arc::new(notifier.clone())),
            notifier,
        )
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = MemoryStore::new();
        let (local, _) = local(&store);
        assert!(local.load().is_empty());
        assert!(local.load_wishlist().is_empty());
        assert!(!local.load_dark_mode());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let store = MemoryStore::new();
        store.insert_raw(CART_KEY, "{not json");
        store.insert_raw(WISHLIST_KEY, "\"oops\"");
        let (local, _) = local(&store);
        assert!(local.load().is_empty());
        assert!(local.load_wishlist().is_empty());
    }

    #[test]
    fn test_load_unavailable_is_empty() {
        let store = MemoryStore::new();
        store.insert_raw(CART_KEY, r#"[{"id":1,"name":"Coat","price":10}]"#);
        store.set_unavailable(true);
        let (local, _) = local(&store);
        assert!(local.load().is_empty());
    }

    #[test]
    fn test_load_report_counts_discarded() {
        let store = MemoryStore::new();
        store.insert_raw(
            CART_KEY,
            &json!([
                {"id": 1, "name": "Coat", "price": 10},
                {"id": 2, "name": "RK Test Product", "price": 10},
                {"id": 3, "name": "Boots", "price": "abc"},
                {"id": "1", "name": "Coat", "price": 10, "quantity": 2}
            ])
            .to_string(),
        );
        let (local, _) = local(&store);
        let report = local.load_report();
        assert_eq!(report.cart.len(), 1);
        assert_eq!(report.cart.get(0).unwrap().quantity, 2);
        assert_eq!(report.discarded, 3);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let (mut local, notifier) = local(&store);
        let cart = Cart::from_json(&json!([{"id": 7, "name": "Scarf", "price": 425}]));
        local.save(&cart).unwrap();
        assert_eq!(local.load(), cart);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_save_failure_warns() {
        let store = MemoryStore::with_quota(4);
        let (mut local, notifier) = local(&store);
        let cart = Cart::from_json(&json!([{"id": 7, "name": "Scarf", "price": 425}]));

        assert!(matches!(
            local.save(&cart),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);
        assert_eq!(store.raw(CART_KEY), None);
    }

    #[test]
    fn test_clear_failure_warns_and_keeps_cart() {
        let store = MemoryStore::new();
        let (mut local, notifier) = local(&store);
        let cart = Cart::from_json(&json!([{"id": 7, "name": "Scarf", "price": 425}]));
        local.save(&cart).unwrap();

        store.set_unavailable(true);
        assert!(matches!(local.clear_cart(), Err(StorageError::Unavailable(_))));
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);

        store.set_unavailable(false);
        assert_eq!(local.load(), cart);
        local.clear_cart().unwrap();
        assert!(local.load().is_empty());
        assert_eq!(notifier.messages(NoticeLevel::Warning).len(), 1);
    }

    #[test]
    fn test_wishlist_and_dark_mode() {
        let store = MemoryStore::new();
        let (mut local, _) = local(&store);
        let wishlist = Wishlist::from_json(&json!([1, "abc"]));
        local.save_wishlist(&wishlist).unwrap();
        local.save_dark_mode(true).unwrap();

        assert_eq!(local.load_wishlist(), wishlist);
        assert!(local.load_dark_mode());
        assert_eq!(store.raw(DARK_MODE_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_clear_cart() {
        let store = MemoryStore::new();
        store.insert_raw(CART_KEY, "[]");
        let (mut local, _) = local(&store);
        local.clear_cart().unwrap();
        assert_eq!(store.raw(CART_KEY), None);
    }
}
