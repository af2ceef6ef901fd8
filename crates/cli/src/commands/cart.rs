//! Cart, wishlist and preference commands.

use tracing::{info, warn};

use vogue_core::{CartError, ProductId};
use vogue_storefront::catalog::{Catalog, ProductSource};
use vogue_storefront::error::{AppError, Result};
use vogue_storefront::session::CartSession;
use vogue_storefront::storage::KeyValueStore;

/// Log the cart lines and subtotal.
pub fn show<S: KeyValueStore>(session: &CartSession<S>) {
    let cart = session.cart();
    if cart.is_empty() {
        info!("Your cart is empty");
        return;
    }

    info!("Cart ({} items)", cart.total_quantity());
    for (index, line) in cart.iter().enumerate() {
        info!(
            "  [{index}] {} ({} / {}) x{} @ {} = ${:.2}",
            line.name,
            line.selected_size.as_deref().unwrap_or("-"),
            line.selected_color.as_deref().unwrap_or("-"),
            line.quantity,
            line.price,
            line.line_total(),
        );
    }
    info!("Subtotal: ${:.2}", cart.subtotal());
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns `AppError::Cart` if the product is unknown or cannot be sold.
pub async fn add<S, C>(
    session: &mut CartSession<S>,
    catalog: &Catalog<C>,
    id: &ProductId,
    size: Option<&str>,
    color: Option<&str>,
    quantity: u32,
) -> Result<()>
where
    S: KeyValueStore,
    C: ProductSource,
{
    let product = catalog
        .find(id)
        .await
        .ok_or_else(|| CartError::UnknownProduct(id.clone()))?;
    let index = session.add_item(&product, size, color, quantity)?;
    if let Some(line) = session.cart().get(index) {
        info!(index, quantity = line.quantity, "Cart line updated");
    }
    Ok(())
}

/// Change a line's quantity.
///
/// # Errors
///
/// Returns `AppError::NotFound` if there is no line at `index`.
pub fn update<S: KeyValueStore>(
    session: &mut CartSession<S>,
    index: usize,
    delta: i64,
) -> Result<()> {
    if !session.update_quantity(index, delta) {
        return Err(AppError::NotFound(format!("cart line {index}")));
    }
    show(session);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns `AppError::NotFound` if there is no line at `index`.
pub fn remove<S: KeyValueStore>(session: &mut CartSession<S>, index: usize) -> Result<()> {
    session
        .remove_item(index)
        .ok_or_else(|| AppError::NotFound(format!("cart line {index}")))?;
    show(session);
    Ok(())
}

/// Log the saved products.
///
/// # Errors
///
/// Never fails; products missing from the catalog are listed by id.
pub async fn show_wishlist<S, C>(session: &CartSession<S>, catalog: &Catalog<C>) -> Result<()>
where
    S: KeyValueStore,
    C: ProductSource,
{
    let wishlist = session.wishlist();
    if wishlist.is_empty() {
        info!("Your wishlist is empty");
        return Ok(());
    }

    info!("Wishlist ({} items)", wishlist.len());
    for id in wishlist.ids() {
        match catalog.find(id).await {
            Some(product) => info!("  {id}: {} by {}", product.name, product.brand),
            None => info!("  {id}: (no longer in the catalog)"),
        }
    }
    Ok(())
}

/// Save or unsave a catalog product.
///
/// # Errors
///
/// Returns `AppError::Cart` if the product is unknown.
pub async fn toggle_wishlist<S, C>(
    session: &mut CartSession<S>,
    catalog: &Catalog<C>,
    id: &ProductId,
) -> Result<()>
where
    S: KeyValueStore,
    C: ProductSource,
{
    let product = catalog
        .find(id)
        .await
        .ok_or_else(|| CartError::UnknownProduct(id.clone()))?;
    session.toggle_wishlist(&product);
    Ok(())
}

/// Store the dark mode preference.
///
/// # Errors
///
/// Never fails; a failed save is logged.
pub fn dark_mode<S: KeyValueStore>(session: &mut CartSession<S>, enabled: bool) -> Result<()> {
    if session.set_dark_mode(enabled) {
        info!(enabled, "Dark mode updated");
    } else {
        warn!(enabled, "Dark mode applies to this run only");
    }
    Ok(())
}
