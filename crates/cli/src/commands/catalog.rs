//! Product listing and catalog seeding.

use std::path::Path;

use tracing::info;

use vogue_core::ProductFilter;
use vogue_storefront::catalog::{Catalog, CatalogFile, ProductSource, SeedOutcome};
use vogue_storefront::error::Result;

use crate::ProductArgs;

/// Log the products passing the given filters.
///
/// # Errors
///
/// Never fails; an unreachable catalog lists as empty.
pub async fn list<C: ProductSource>(catalog: &Catalog<C>, args: ProductArgs) -> Result<()> {
    let filter = ProductFilter {
        category: args.category,
        subcategory: args.subcategory,
        brands: args.brands,
        sizes: args.sizes,
        colors: args.colors,
        min_price: args.min_price,
        max_price: args.max_price,
        query: args.search,
        sort: args.sort,
    };

    let products = catalog.list(&filter).await;
    info!("{} products (sorted by {})", products.len(), filter.sort);
    for product in &products {
        let price = product
            .price
            .map_or_else(|| "unavailable".to_string(), |p| p.to_string());
        let badge = product
            .badge
            .as_deref()
            .map(|b| format!(" [{b}]"))
            .unwrap_or_default();
        info!("  {}: {} by {} - {price}{badge}", product.id, product.name, product.brand);
    }
    Ok(())
}

/// Seed an empty catalog from a YAML file.
///
/// # Errors
///
/// Returns `AppError::Catalog` if the file cannot be read or a write fails.
pub async fn seed<C: ProductSource>(catalog: &Catalog<C>, path: &Path) -> Result<()> {
    info!(path = %path.display(), "Loading catalog file");
    let file = CatalogFile::load(path).await?;
    info!(products = file.products.len(), "Parsed catalog file");

    match catalog.seed(&file.products).await? {
        SeedOutcome::Seeded { count } => {
            info!("Seeding complete!");
            info!("  Products inserted: {count}");
        }
        SeedOutcome::Skipped { existing } => {
            info!("Catalog already seeded, nothing to do");
            info!("  Existing products: {existing}");
        }
    }
    Ok(())
}
