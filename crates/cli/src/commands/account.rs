//! Sign-in and checkout.

use tracing::info;

use vogue_storefront::checkout::{MockGateway, ShippingDetails};
use vogue_storefront::config::StorefrontConfig;
use vogue_storefront::error::{AppError, Result};
use vogue_storefront::profile::ProfileStore;
use vogue_storefront::session::{CartSession, SignInSource};
use vogue_storefront::storage::KeyValueStore;
use vogue_storefront::sync::ProfileSync;

use crate::CheckoutArgs;

/// Sign in as the configured user and report how the cart was reconciled.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if no user is configured.
pub async fn login<S, P>(
    session: &mut CartSession<S>,
    config: &StorefrontConfig,
    sync: &ProfileSync<P>,
) -> Result<()>
where
    S: KeyValueStore,
    P: ProfileStore,
{
    let user = config
        .user
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("set VOGUE_USER_ID to sign in".to_string()))?;

    let report = session.sign_in(user.to_user(), sync).await;
    match report.source {
        SignInSource::Merged => info!("Merged your saved cart with this device"),
        SignInSource::LocalUploaded => info!("Saved this device's cart to your account"),
        SignInSource::LocalOnly => info!("Using the cart on this device"),
    }
    info!("  Cart lines: {}", report.cart_lines);
    info!("  Wishlist items: {}", report.wishlist_items);
    Ok(())
}

/// Pay for the cart with the mock gateway.
///
/// # Errors
///
/// Returns `AppError::Checkout` if the shipping details are invalid, nobody
/// is signed in, or the cart is empty.
pub async fn checkout<S: KeyValueStore>(
    session: &mut CartSession<S>,
    config: &StorefrontConfig,
    args: &CheckoutArgs,
) -> Result<()> {
    let details = ShippingDetails::new(
        &args.name,
        &args.email,
        &args.address,
        &args.city,
        &args.postal_code,
    )?;

    info!("Processing payment...");
    let receipt = session
        .checkout(&MockGateway::new(config.checkout_delay), &details)
        .await?;

    info!("Order confirmed!");
    info!("  Order: {}", receipt.order_id);
    info!("  Charged: ${:.2}", receipt.amount);
    info!("  Ships to: {}, {}", details.address, details.city);
    Ok(())
}
