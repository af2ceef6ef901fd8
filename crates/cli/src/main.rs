//! VOGUE CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! vogue --catalog products.yaml products --category women --sort price-low
//!
//! # Manage the cart
//! vogue --catalog products.yaml cart add 3 --size m --color black
//! vogue cart update 0 +1
//! vogue cart show
//!
//! # Sign in (merges the device cart with the saved one) and pay
//! VOGUE_USER_ID=uid-1 vogue login
//! VOGUE_USER_ID=uid-1 vogue checkout --name "Ada Lovelace" --email ada@vogue.example \
//!     --address "12 Analytical Row" --city London --postal-code "N1 9GU"
//!
//! # Seed an empty catalog
//! vogue seed products.yaml
//! ```
//!
//! # Commands
//!
//! - `products` - List products with filters and sorting
//! - `cart` - Show and edit the cart
//! - `wishlist` - Show and edit the wishlist
//! - `login` - Sign in and reconcile the cart with the saved profile
//! - `checkout` - Pay for the cart
//! - `seed` - Seed an empty catalog from a YAML file
//! - `dark-mode` - Set the display preference

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vogue_core::{Price, ProductId, SortOrder};
use vogue_storefront::config::StorefrontConfig;
use vogue_storefront::error::AppError;

mod commands;

#[derive(Parser)]
#[command(name = "vogue")]
#[command(author, version, about = "VOGUE storefront CLI")]
struct Cli {
    /// Read products from a YAML catalog instead of Firestore
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List products
    Products(ProductArgs),
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show and edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Sign in as the configured user
    Login,
    /// Pay for the cart
    Checkout(CheckoutArgs),
    /// Seed an empty catalog from a YAML file
    Seed {
        /// Path to the YAML catalog
        file: PathBuf,
    },
    /// Turn dark mode on or off
    DarkMode {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    subcategory: Option<String>,
    /// Brand slug (repeatable)
    #[arg(long = "brand")]
    brands: Vec<String>,
    /// Size (repeatable)
    #[arg(long = "size")]
    sizes: Vec<String>,
    /// Color (repeatable)
    #[arg(long = "color")]
    colors: Vec<String>,
    #[arg(long)]
    min_price: Option<Price>,
    #[arg(long)]
    max_price: Option<Price>,
    /// Match against product name or brand
    #[arg(short, long)]
    search: Option<String>,
    /// `popularity`, `price-low`, `price-high`, `rating` or `new`
    #[arg(long, default_value_t = SortOrder::Popularity)]
    sort: SortOrder,
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the subtotal
    Show,
    /// Add a product
    Add {
        product: ProductId,
        #[arg(short, long)]
        size: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change a line's quantity by a signed amount
    Update {
        /// Line index, as shown by `cart show`
        index: usize,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Remove a line
    Remove {
        /// Line index, as shown by `cart show`
        index: usize,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List saved products
    Show,
    /// Save or unsave a product
    Toggle { product: ProductId },
}

#[derive(clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vogue=info,vogue_storefront=info,vogue_core=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => commands::run(cli, config).await,
        Err(e) => Err(AppError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}
