//! Cart sanitization.
//!
//! Cart records come back from device storage and from profile documents with
//! no schema guarantees: older app versions, hand-edited data and leftover QA
//! entries all show up. Sanitizing is a single, order-preserving, fail-open pass:
//! every record is judged on its own, rejections are logged, and the remaining
//! records are returned.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use super::LineItem;
use crate::types::{Price, PriceError, ProductId};

/// Lower-case name fragments that mark synthetic test entries.
pub const GHOST_MARKERS: &[&str] = &["rk test", "test product"];

/// Why a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Not a JSON object.
    NotARecord,
    /// Name matches a ghost marker.
    Ghost,
    /// Price missing, non-numeric or negative.
    InvalidPrice(PriceError),
    /// Name missing, empty or not a string.
    MissingName,
    /// Id missing, null, or an array or object.
    MissingId,
    /// Passed the checks but could not be read as a line item.
    Malformed(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARecord => f.write_str("not a record"),
            Self::Ghost => f.write_str("ghost item"),
            Self::InvalidPrice(e) => write!(f, "invalid price: {e}"),
            Self::MissingName => f.write_str("missing name"),
            Self::MissingId => f.write_str("missing id"),
            Self::Malformed(e) => write!(f, "malformed record: {e}"),
        }
    }
}

/// Whether a product name carries a ghost marker (case-insensitive).
#[must_use]
pub fn is_ghost(name: &str) -> bool {
    let lower = name.to_lowercase();
    GHOST_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Sanitize a value claiming to be a cart.
///
/// Anything other than a JSON array yields an empty list.
#[must_use]
pub fn sanitize(raw: &Value) -> Vec<LineItem> {
    match raw {
        Value::Array(items) => sanitize_items(items),
        Value::Null => Vec::new(),
        other => {
            debug!(kind = json_kind(other), "Cart data is not a list, treating as empty");
            Vec::new()
        }
    }
}

/// Sanitize a list of raw cart records, keeping the valid ones in order.
#[must_use]
pub fn sanitize_items(items: &[Value]) -> Vec<LineItem> {
    items
        .iter()
        .enumerate()
        .filter_map(|(position, raw)| match validate(raw) {
            Ok(item) => Some(item),
            Err(rejection) => {
                let item_name = raw.get("name").and_then(Value::as_str).unwrap_or("<none>");
                let item_price = raw.get("price").unwrap_or(&Value::Null);
                warn!(
                    position,
                    name = item_name,
                    price = %item_price,
                    reason = %rejection,
                    "Removed invalid cart item"
                );
                None
            }
        })
        .collect()
}

/// Judge a single raw record.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies, checked in this order: record
/// shape, ghost marker, price, name, id.
///
/// Optional fields of the wrong type (`image: 7`, `selectedSize: 42`) are read
/// as absent rather than failing the record.
pub fn validate(raw: &Value) -> Result<LineItem, Rejection> {
    let Some(record) = raw.as_object() else {
        return Err(Rejection::NotARecord);
    };

    let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
    if is_ghost(name) {
        return Err(Rejection::Ghost);
    }

    Price::from_json(record.get("price").unwrap_or(&Value::Null))
        .map_err(Rejection::InvalidPrice)?;

    if name.is_empty() {
        return Err(Rejection::MissingName);
    }

    if record.get("id").and_then(ProductId::from_json).is_none() {
        return Err(Rejection::MissingId);
    }

    serde_json::from_value(raw.clone()).map_err(|e| Rejection::Malformed(e.to_string()))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_non_array_is_empty() {
        assert!(sanitize(&json!(null)).is_empty());
        assert!(sanitize(&json!("cart")).is_empty());
        assert!(sanitize(&json!({"id": 1})).is_empty());
    }

    #[test]
    fn test_ghost_items_removed() {
        let raw = json!([{"name": "RK Test Product", "price": 10, "id": 9}]);
        assert!(sanitize(&raw).is_empty());
        assert!(is_ghost("My TEST PRODUCT"));
        assert!(is_ghost("rk testing jacket"));
        assert!(!is_ghost("Testament Hoodie"));
    }

    #[test]
    fn test_price_coerced_from_string() {
        let items = sanitize(&json!([{"id": 1, "name": "Coat", "price": "99.5"}]));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, "99.5".parse().unwrap());
        assert_eq!(items[0].quantity, 1);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(validate(&json!(5)), Err(Rejection::NotARecord));
        assert!(matches!(
            validate(&json!({"id": 1, "name": "Coat", "price": "free"})),
            Err(Rejection::InvalidPrice(_))
        ));
        assert!(matches!(
            validate(&json!({"id": 1, "name": "Coat", "price": -5})),
            Err(Rejection::InvalidPrice(PriceError::Negative(_)))
        ));
        assert!(matches!(
            validate(&json!({"id": 1, "name": "Coat"})),
            Err(Rejection::InvalidPrice(_))
        ));
        assert_eq!(
            validate(&json!({"id": 1, "name": "", "price": 5})),
            Err(Rejection::MissingName)
        );
        assert_eq!(
            validate(&json!({"id": 1, "name": 12, "price": 5})),
            Err(Rejection::MissingName)
        );
        assert_eq!(
            validate(&json!({"id": null, "name": "Coat", "price": 5})),
            Err(Rejection::MissingId)
        );
        assert_eq!(
            validate(&json!({"name": "Coat", "price": 5})),
            Err(Rejection::MissingId)
        );
        assert_eq!(
            validate(&json!({"id": [1], "name": "Coat", "price": 5})),
            Err(Rejection::MissingId)
        );
    }

    #[test]
    fn test_any_scalar_id_is_kept() {
        let float = validate(&json!({"id": 1.5, "name": "Coat", "price": 5})).unwrap();
        assert_eq!(float.id.to_string(), "1.5");

        let flag = validate(&json!({"id": true, "name": "Coat", "price": 5})).unwrap();
        assert_eq!(flag.id.to_string(), "true");

        let empty = validate(&json!({"id": "", "name": "Coat", "price": 5})).unwrap();
        assert_eq!(empty.id.to_string(), "");
    }

    #[test]
    fn test_oddly_typed_optional_fields_read_as_absent() {
        let item = validate(&json!({
            "id": 1, "name": "Coat", "price": 5,
            "image": 7, "selectedSize": 42, "selectedColor": false
        }))
        .unwrap();
        assert_eq!(item.image, None);
        assert_eq!(item.selected_size, None);
        assert_eq!(item.selected_color, None);

        let stored = serde_json::to_value(&item).unwrap();
        assert!(stored.get("selectedSize").is_none());
        assert_eq!(sanitize(&json!([stored])), vec![item]);
    }

    #[test]
    fn test_string_price_uses_leading_number() {
        let item = validate(&json!({"id": 1, "name": "Coat", "price": "12abc"})).unwrap();
        assert_eq!(item.price, "12".parse().unwrap());

        assert!(matches!(
            validate(&json!({"id": 1, "name": "Coat", "price": "abc12"})),
            Err(Rejection::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_fail_open_keeps_order() {
        let raw = json!([
            {"id": 1, "name": "First", "price": 1},
            null,
            {"id": 2, "name": "Second", "price": -1},
            {"id": 3, "name": "Third", "price": 3},
            {"id": 4, "name": "test product", "price": 4},
            {"id": "5", "name": "Fifth", "price": "5"}
        ]);
        let names: Vec<_> = sanitize(&raw).into_iter().map(|item| item.name).collect();
        assert_eq!(names, ["First", "Third", "Fifth"]);
    }

    #[test]
    fn test_idempotent() {
        let raw = json!([
            {"id": 1, "name": "Coat", "price": "10", "quantity": 0, "brand": "Gucci"},
            {"id": 2, "name": "Boots", "price": 950, "selectedSize": "m"},
            {"id": 3, "name": "rk test", "price": 1}
        ]);
        let once = sanitize(&raw);
        let twice = sanitize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
