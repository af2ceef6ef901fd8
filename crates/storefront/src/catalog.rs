//! Product catalog service.
//!
//! Products come from a [`ProductSource`]: the `products` collection in
//! Firestore, or a YAML file for offline use. [`Catalog`] caches the listing
//! using `moka` and never fails a read; an unreachable source lists as empty.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use vogue_core::{Product, ProductFilter, ProductId};

use crate::firestore::{FirestoreClient, FirestoreError, value};

/// Collection holding product documents.
pub const PRODUCTS_COLLECTION: &str = "products";

const CACHE_KEY: &str = "products";

/// Errors that can occur when reading or writing the product source.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Firestore request failed.
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A product could not be encoded or decoded.
    #[error("Product decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Where products are read from and seeded into.
pub trait ProductSource: Send + Sync {
    /// Every product, in source order.
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    /// Add one product.
    fn insert_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

/// Catalog file layout.
///
/// ```yaml
/// products:
///   - id: 1
///     name: Oversized Cashmere Sweater
///     brand: Saint Laurent
///     price: 890
///     sizes: [s, m, l]
/// ```
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<Product>,
}

impl CatalogFile {
    /// Parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Yaml` if the content is not a valid catalog.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&content)
    }
}

/// Product source held in memory, typically loaded from a catalog file.
/// Clones share the same products.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Arc<RwLock<Vec<Product>>>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        Ok(Self::new(CatalogFile::load(path).await?.products))
    }
}

impl ProductSource for StaticCatalog {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogError> {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(product.clone());
        Ok(())
    }
}

impl ProductSource for FirestoreClient {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let documents = self.list_documents(PRODUCTS_COLLECTION).await?;
        let mut products = Vec::with_capacity(documents.len());
        for document in documents {
            match product_from_document(&document.id, document.fields) {
                Ok(product) => products.push(product),
                Err(e) => {
                    warn!(document_id = %document.id, error = %e, "Skipping malformed product");
                }
            }
        }
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogError> {
        let fields = product_fields(product)?;
        self.create_document(PRODUCTS_COLLECTION, None, value::encode_fields(&fields))
            .await?;
        Ok(())
    }
}

/// Fields of a new product document. The store assigns the id.
fn product_fields(product: &Product) -> Result<Map<String, Value>, CatalogError> {
    let Value::Object(mut fields) = serde_json::to_value(product)? else {
        return Ok(Map::new());
    };
    fields.remove("id");
    Ok(fields)
}

/// Read a product document; its id is the document name.
fn product_from_document(
    id: &str,
    mut fields: Map<String, Value>,
) -> Result<Product, serde_json::Error> {
    fields.insert("id".to_owned(), Value::String(id.to_owned()));
    serde_json::from_value(Value::Object(fields))
}

/// Result of seeding the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The source already had products; nothing was written.
    Skipped { existing: usize },
    /// Products were written.
    Seeded { count: usize },
}

/// Cached product catalog.
#[derive(Clone)]
pub struct Catalog<P> {
    source: P,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl<P: ProductSource> Catalog<P> {
    /// Wrap a source with a listing cache of the given lifetime.
    #[must_use]
    pub fn new(source: P, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { source, cache }
    }

    /// Every product. Failures are logged, not cached, and list as empty.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Arc<Vec<Product>> {
        if let Some(products) = self.cache.get(CACHE_KEY).await {
            return products;
        }

        match self.source.fetch_products().await {
            Ok(products) => {
                info!(count = products.len(), "Loaded products");
                let products = Arc::new(products);
                self.cache.insert(CACHE_KEY, Arc::clone(&products)).await;
                products
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                Arc::new(Vec::new())
            }
        }
    }

    /// Products passing a filter, in the filter's order.
    pub async fn list(&self, filter: &ProductFilter) -> Vec<Product> {
        let products = self.products().await;
        filter.apply(&products).into_iter().cloned().collect()
    }

    /// Look up one product.
    pub async fn find(&self, id: &ProductId) -> Option<Product> {
        self.products()
            .await
            .iter()
            .find(|product| &product.id == id)
            .cloned()
    }

    /// Write `products` to an empty source. A source that already has
    /// products is left alone.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source cannot be read or a write fails.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn seed(&self, products: &[Product]) -> Result<SeedOutcome, CatalogError> {
        let existing = self.source.fetch_products().await?.len();
        if existing > 0 {
            info!(existing, "Catalog already has products, skipping seed");
            return Ok(SeedOutcome::Skipped { existing });
        }

        for product in products {
            self.source.insert_product(product).await?;
        }
        self.cache.invalidate(CACHE_KEY).await;

        info!(count = products.len(), "Seeded catalog");
        Ok(SeedOutcome::Seeded {
            count: products.len(),
        })
    }
}
