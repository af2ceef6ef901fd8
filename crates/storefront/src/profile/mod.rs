//! Remote user profiles.
//!
//! Each signed-in shopper has one profile document (`users/{uid}`) holding
//! their identity fields plus the last-synced copies of their cart and
//! wishlist. [`ProfileStore`] is the document-store seam; [`FirestoreClient`]
//! implements it for production and [`MemoryProfileStore`] for tests and
//! offline use.
//!
//! [`FirestoreClient`]: crate::firestore::FirestoreClient

mod firestore;
mod memory;

pub use memory::MemoryProfileStore;

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use vogue_core::{Cart, UserId, Wishlist};

use crate::firestore::FirestoreError;

/// Collection holding profile documents.
pub const USERS_COLLECTION: &str = "users";

/// Errors that can occur when reading or writing profiles.
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    /// The profile document does not exist.
    #[error("Profile not found: {0}")]
    NotFound(UserId),

    /// Firestore request failed.
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// The store cannot be reached.
    #[error("Profile store unavailable: {0}")]
    Unavailable(String),

    /// The document could not be decoded.
    #[error("Profile decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Profile fields the cart core writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Cart,
    Wishlist,
}

impl ProfileField {
    /// Document field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed-in shopper, as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl AuthenticatedUser {
    /// A user known only by id.
    #[must_use]
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }

    /// Fields of a freshly created profile: identity, creation time, and an
    /// empty cart and wishlist.
    #[must_use]
    pub fn new_profile_fields(&self, created_at: DateTime<Utc>) -> Map<String, Value> {
        let Value::Object(fields) = json!({
            "email": self.email,
            "displayName": self.display_name,
            "photoURL": self.photo_url,
            "createdAt": created_at.to_rfc3339(),
            "cart": [],
            "wishlist": [],
        }) else {
            return Map::new();
        };
        fields
    }
}

/// A profile document as read by the cart core.
///
/// `cart` is sanitized on read and `wishlist` keeps only id-shaped entries, so
/// a profile is usable whatever the document holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub wishlist: Wishlist,
}

impl UserProfile {
    /// Decode plain document fields.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if an identity field has the wrong type.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(fields))
    }
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc)))
}

/// Document store holding user profiles.
pub trait ProfileStore: Send + Sync {
    /// Read a whole profile. `Ok(None)` when it does not exist.
    fn fetch_profile(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<UserProfile>, ProfileStoreError>> + Send;

    /// Whether a profile document exists.
    fn profile_exists(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<bool, ProfileStoreError>> + Send;

    /// Create the profile document for a user, with empty cart and wishlist.
    /// Creating a profile that already exists succeeds without changes.
    fn create_profile(
        &self,
        user: &AuthenticatedUser,
    ) -> impl Future<Output = Result<(), ProfileStoreError>> + Send;

    /// Overwrite one field of an existing profile, leaving the others alone.
    /// Fails with [`ProfileStoreError::NotFound`] if the profile does not exist.
    fn update_field(
        &self,
        user: &UserId,
        field: ProfileField,
        value: &Value,
    ) -> impl Future<Output = Result<(), ProfileStoreError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_sanitizes_cart() {
        let fields = json!({
            "email": "shopper@vogue.example",
            "photoURL": "https://cdn.vogue.example/me.jpg",
            "createdAt": "2026-01-10T09:30:00Z",
            "cart": [
                {"id": 1, "name": "Coat", "price": 10},
                {"id": 9, "name": "RK Test Product", "price": 10}
            ],
            "wishlist": [4, null, "x"]
        });
        let Value::Object(fields) = fields else {
            unreachable!()
        };
        let profile = UserProfile::from_fields(fields).unwrap();

        assert_eq!(profile.cart.len(), 1);
        assert_eq!(profile.wishlist.len(), 2);
        assert_eq!(
            profile.photo_url.as_deref(),
            Some("https://cdn.vogue.example/me.jpg")
        );
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_profile_tolerates_missing_and_odd_fields() {
        let Value::Object(fields) = json!({"cart": "nope", "createdAt": 12}) else {
            unreachable!()
        };
        let profile = UserProfile::from_fields(fields).unwrap();
        assert!(profile.cart.is_empty());
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn test_new_profile_fields() {
        let user = AuthenticatedUser {
            email: Some("shopper@vogue.example".to_string()),
            ..AuthenticatedUser::new("uid-1")
        };
        let fields = user.new_profile_fields(Utc::now());
        assert_eq!(fields.get("cart"), Some(&json!([])));
        assert_eq!(fields.get("wishlist"), Some(&json!([])));
        assert_eq!(fields.get("displayName"), Some(&Value::Null));
        assert!(fields.get("createdAt").is_some_and(Value::is_string));
    }
}
