//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing identifiers handed out by different systems (the identity
//! provider, the checkout gateway, ...).
//!
//! [`ProductId`] is special: product identifiers come from the document store,
//! from seed data and from whatever older app versions left on the device, so on
//! the wire they can be any JSON scalar.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use vogue_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("abc");
/// let order_id = OrderId::new("abc");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Identity-provider user id (Firebase `uid`).
define_id!(UserId);
// Reference handed back by the checkout gateway.
define_id!(OrderId);

impl OrderId {
    /// Generate a fresh random order reference.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("VG-{}", uuid::Uuid::new_v4().simple()))
    }
}

/// Product identifier.
///
/// Seed data uses integer ids while documents created by the store carry string
/// ids. Any scalar is accepted and written back unchanged. Equality and hashing
/// use the canonical text form, which makes `1` and `"1"` the same product.
///
/// ```
/// use vogue_core::ProductId;
///
/// assert_eq!(ProductId::from(7), ProductId::from("7"));
/// assert_ne!(ProductId::from(7), ProductId::from("07"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    /// Integer id, as used by seed data.
    Number(i64),
    /// Non-integer numeric id.
    Float(f64),
    /// Boolean id left behind by hand-edited data.
    Flag(bool),
    /// Opaque document id.
    Text(String),
}

impl ProductId {
    /// Canonical text form used for comparisons and composite keys.
    #[must_use]
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Flag(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Build a product id from a JSON value, if it has an id shape.
    ///
    /// Any scalar qualifies; `null`, arrays and objects do not.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Number)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::Bool(b) => Some(Self::Flag(*b)),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl PartialEq for ProductId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ProductId {}

impl Hash for ProductId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl std::str::FromStr for ProductId {
    type Err = std::convert::Infallible;

    /// Parses command-line input: all-digit input becomes a numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Number))
    }
}
