//! Command implementations.
//!
//! Every command runs against one [`CartSession`] opened from the data
//! directory. When a user is configured the session signs in first, so each
//! command sees the cart merged with the saved profile.

mod account;
mod cart;
mod catalog;

use std::sync::Arc;

use tracing::debug;

use vogue_storefront::catalog::{Catalog, ProductSource, StaticCatalog};
use vogue_storefront::config::StorefrontConfig;
use vogue_storefront::error::Result;
use vogue_storefront::firestore::FirestoreClient;
use vogue_storefront::notify::TracingNotifier;
use vogue_storefront::profile::{MemoryProfileStore, ProfileStore};
use vogue_storefront::session::CartSession;
use vogue_storefront::storage::{FileStore, LocalCartStore};
use vogue_storefront::sync::{ProfileSync, SyncOutbox};

use crate::{CartAction, Cli, Command, WishlistAction};

/// Pick the backends from configuration and run one command.
///
/// # Errors
///
/// Returns `AppError` if a backend cannot be set up or the command fails.
pub async fn run(cli: Cli, config: StorefrontConfig) -> Result<()> {
    let file_catalog = match &cli.catalog {
        Some(path) => Some(StaticCatalog::load(path).await?),
        None => None,
    };
    let ttl = config.catalog_cache_ttl;

    if let Some(firestore) = &config.firestore {
        let client = FirestoreClient::new(firestore)?;
        let sync = ProfileSync::new(client.clone());
        match file_catalog {
            Some(source) => dispatch(cli.command, &config, sync, Catalog::new(source, ttl)).await,
            None => dispatch(cli.command, &config, sync, Catalog::new(client, ttl)).await,
        }
    } else {
        debug!("Firestore not configured, profile changes stay in this process");
        let sync = ProfileSync::new(MemoryProfileStore::new());
        let source = file_catalog.unwrap_or_default();
        dispatch(cli.command, &config, sync, Catalog::new(source, ttl)).await
    }
}

async fn dispatch<P, C>(
    command: Command,
    config: &StorefrontConfig,
    sync: ProfileSync<P>,
    catalog: Catalog<C>,
) -> Result<()>
where
    P: ProfileStore + Clone + 'static,
    C: ProductSource,
{
    let store = FileStore::new(&config.data_dir).with_quota(config.storage_quota_bytes);
    let local = LocalCartStore::new(store, Arc::new(TracingNotifier));
    let mut session = CartSession::open(local).with_outbox(SyncOutbox::spawn(sync.clone()));

    if let Some(user) = &config.user
        && !matches!(command, Command::Login)
    {
        session.sign_in(user.to_user(), &sync).await;
    }

    let result = match command {
        Command::Products(args) => catalog::list(&catalog, args).await,
        Command::Seed { file } => catalog::seed(&catalog, &file).await,
        Command::Cart { action } => match action {
            CartAction::Show => {
                cart::show(&session);
                Ok(())
            }
            CartAction::Add {
                product,
                size,
                color,
                quantity,
            } => {
                cart::add(
                    &mut session,
                    &catalog,
                    &product,
                    size.as_deref(),
                    color.as_deref(),
                    quantity,
                )
                .await
            }
            CartAction::Update { index, delta } => cart::update(&mut session, index, delta),
            CartAction::Remove { index } => cart::remove(&mut session, index),
        },
        Command::Wishlist { action } => match action {
            WishlistAction::Show => cart::show_wishlist(&session, &catalog).await,
            WishlistAction::Toggle { product } => {
                cart::toggle_wishlist(&mut session, &catalog, &product).await
            }
        },
        Command::DarkMode { state } => cart::dark_mode(&mut session, state == "on"),
        Command::Login => account::login(&mut session, config, &sync).await,
        Command::Checkout(args) => account::checkout(&mut session, config, &args).await,
    };

    // Let queued profile pushes land before the process exits
    session.flush().await;
    result
}
