//! Product catalog types and listing filters.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A catalog product.
///
/// Deserialization is lenient: everything except `id` may be missing, since
/// documents in the store are edited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Single color, used by older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

impl Product {
    /// Brand as used in filter values: lower-case with dashes for spaces.
    #[must_use]
    pub fn brand_slug(&self) -> String {
        slugify(&self.brand)
    }

    /// Every color the product is offered in.
    pub fn all_colors(&self) -> impl Iterator<Item = &str> {
        self.colors
            .iter()
            .map(String::as_str)
            .chain(self.color.as_deref())
    }

    /// Whether the product is badged as new.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.badge.as_deref() == Some("New")
    }
}

/// Lower-case a label and replace spaces with dashes.
#[must_use]
pub fn slugify(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "-")
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    Popularity,
    PriceLow,
    PriceHigh,
    Rating,
    /// Products badged "New" first.
    New,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity" => Ok(Self::Popularity),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "rating" => Ok(Self::Rating),
            "new" => Ok(Self::New),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Popularity => "popularity",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::New => "new",
        })
    }
}

/// Filters applied to the product listing.
///
/// Empty lists and `None` mean "no constraint". Filters combine with AND; values
/// inside one list combine with OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Brand slugs (see [`slugify`]).
    pub brands: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Inclusive bounds.
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    /// Case-insensitive match against name or brand.
    pub query: Option<String>,
    pub sort: SortOrder,
}

impl ProductFilter {
    /// Whether a single product passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && product.category.as_deref() != Some(category.as_str())
        {
            return false;
        }
        if let Some(subcategory) = &self.subcategory
            && product.subcategory.as_deref() != Some(subcategory.as_str())
        {
            return false;
        }
        if !self.brands.is_empty() && !self.brands.contains(&product.brand_slug()) {
            return false;
        }
        if !self.sizes.is_empty() && !product.sizes.iter().any(|size| self.sizes.contains(size)) {
            return false;
        }
        if !self.colors.is_empty()
            && !product
                .all_colors()
                .any(|color| self.colors.iter().any(|wanted| wanted == color))
        {
            return false;
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = product.price else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min)
                || self.max_price.is_some_and(|max| price > max)
            {
                return false;
            }
        }
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            if !product.name.to_lowercase().contains(&query)
                && !product.brand.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }

    /// Filter and sort a listing. Sorting is stable, so ties keep catalog order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut listed: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortOrder::Popularity => {}
            SortOrder::PriceLow => listed.sort_by(|a, b| compare_price(a, b, false)),
            SortOrder::PriceHigh => listed.sort_by(|a, b| compare_price(a, b, true)),
            SortOrder::Rating => listed.sort_by(|a, b| {
                b.rating
                    .unwrap_or(0.0)
                    .partial_cmp(&a.rating.unwrap_or(0.0))
                    .unwrap_or(Ordering::Equal)
            }),
            SortOrder::New => listed.sort_by_key(|p| !p.is_new()),
        }
        listed
    }
}

// Unpriced products sort after priced ones in both directions.
fn compare_price(a: &Product, b: &Product, descending: bool) -> Ordering {
    match (a.price, b.price) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
