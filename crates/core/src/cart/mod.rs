//! Cart and wishlist model.
//!
//! A [`Cart`] is an ordered list of [`LineItem`]s that never holds two entries
//! with the same identity triple ([`LineKey`]). Raw cart data read from device
//! storage or from a user's profile document goes through [`sanitize`] before it
//! becomes a cart; carts from two sources are reconciled with [`merge`].

pub mod merge;
pub mod sanitize;

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{Price, ProductId};

pub use merge::{merge, merge_wishlist};
pub use sanitize::{GHOST_MARKERS, Rejection, is_ghost, sanitize, sanitize_items, validate};

/// Size recorded when neither the shopper nor the product picks one.
pub const DEFAULT_SIZE: &str = "One Size";

/// Color recorded when neither the shopper nor the product picks one.
pub const DEFAULT_COLOR: &str = "Default";

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// The product is missing data a cart line needs.
    #[error("product {id} cannot be added to the cart: {reason}")]
    InvalidProduct {
        /// Offending product.
        id: ProductId,
        /// What is missing.
        reason: &'static str,
    },
    /// No product with this id exists in the catalog.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// One cart row: a product, the chosen variant and a quantity.
///
/// Unknown fields of the record this item was read from are kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(
        default,
        deserialize_with = "text_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    /// `None` when the record carries no size at all.
    #[serde(
        default,
        deserialize_with = "text_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_size: Option<String>,
    /// `None` when the record carries no color at all.
    #[serde(
        default,
        deserialize_with = "text_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_color: Option<String>,
    /// Always at least 1.
    #[serde(default = "one", deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

const fn one() -> u32 {
    1
}

// Non-string values count as missing.
fn text_or_absent<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn deserialize_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_quantity(value.as_ref()))
}

/// Coerce a stored quantity to a count of at least 1.
///
/// Missing, non-numeric and sub-1 values become 1; fractional values are
/// truncated; values beyond `u32::MAX` saturate.
#[must_use]
pub fn coerce_quantity(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|u| u32::try_from(u).unwrap_or(u32::MAX))
            .or_else(|| n.as_f64().and_then(whole_count)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(whole_count),
        _ => None,
    };
    parsed.unwrap_or(1).max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // bounds checked above the cast
fn whole_count(n: f64) -> Option<u32> {
    if !n.is_finite() || n < 1.0 {
        return None;
    }
    Some(n.min(f64::from(u32::MAX)).trunc() as u32)
}

impl LineItem {
    /// Identity triple of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(
            &self.id,
            self.selected_size.as_deref(),
            self.selected_color.as_deref(),
        )
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// Identity triple `(product id, size, color)` used to deduplicate cart lines.
///
/// An absent size or color is its own value: it equals another absent value
/// and nothing else, so it never collides with a real variant literally named
/// like [`DEFAULT_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    id: String,
    size: Option<String>,
    color: Option<String>,
}

impl LineKey {
    /// Build a key.
    #[must_use]
    pub fn new(id: &ProductId, size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            id: id.canonical().into_owned(),
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
        }
    }
}

/// An ordered shopping cart, unique by [`LineKey`].
///
/// Deserializing a cart sanitizes the input and collapses duplicate lines, so
/// a `Cart` read from anywhere upholds the same invariants as one built by
/// [`Cart::add`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from arbitrary items, collapsing duplicate keys with the
    /// merge policy (largest quantity wins).
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self {
            items: merge(&items, &[]),
        }
    }

    /// Sanitize a raw JSON value into a cart.
    #[must_use]
    pub fn from_json(raw: &Value) -> Self {
        Self::from_items(sanitize(raw))
    }

    /// The lines, in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate the lines.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.items.get(index)
    }

    /// Index of the line with this key.
    #[must_use]
    pub fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|item| &item.key() == key)
    }

    /// Add a line, or increase the quantity of the existing line with the same
    /// key. Returns the index of the affected line.
    pub fn add(&mut self, item: LineItem) -> usize {
        if let Some(index) = self.position(&item.key())
            && let Some(existing) = self.items.get_mut(index)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity.max(1));
            return index;
        }
        let mut item = item;
        item.quantity = item.quantity.max(1);
        self.items.push(item);
        self.items.len() - 1
    }

    /// Adjust the quantity of the line at `index` by `delta`, never going below
    /// 1. Returns the new quantity, or `None` if there is no such line.
    pub fn update_quantity(&mut self, index: usize, delta: i64) -> Option<u32> {
        let item = self.items.get_mut(index)?;
        let next = i64::from(item.quantity).saturating_add(delta).max(1);
        item.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        Some(item.quantity)
    }

    /// Remove the line at `index`.
    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// JSON array form, as persisted and synced.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.items).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&raw))
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Ordered, duplicate-free list of saved products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Wishlist {
    ids: Vec<ProductId>,
}

impl Wishlist {
    /// An empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Build a wishlist from ids, dropping repeats (first occurrence wins).
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = ProductId>) -> Self {
        let mut seen = HashSet::new();
        Self {
            ids: ids.into_iter().filter(|id| seen.insert(id.clone())).collect(),
        }
    }

    /// Read a wishlist from raw JSON, keeping only id-shaped entries.
    #[must_use]
    pub fn from_json(raw: &Value) -> Self {
        raw.as_array().map_or_else(Self::new, |entries| {
            Self::from_ids(entries.iter().filter_map(ProductId::from_json))
        })
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now saved.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if let Some(index) = self.ids.iter().position(|saved| saved == id) {
            self.ids.remove(index);
            false
        } else {
            self.ids.push(id.clone());
            true
        }
    }

    /// Whether `id` is saved.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    /// Saved ids, in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Number of saved products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// JSON array form, as persisted and synced.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.ids).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

impl<'de> Deserialize<'de> for Wishlist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&raw))
    }
}
