//! Shopping session: the one owner of the in-memory cart.
//!
//! A [`CartSession`] is opened from device storage when the storefront starts
//! and dropped when the shopper leaves. Every cart mutation goes through it:
//! the in-memory cart changes first, then device storage is written, then a
//! cloud push is queued if a user is signed in. Only the push is asynchronous.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use vogue_core::cart::{DEFAULT_COLOR, DEFAULT_SIZE};
use vogue_core::{Cart, CartError, LineItem, Product, Wishlist, merge, merge_wishlist};

use crate::checkout::{CheckoutError, PaymentGateway, PaymentReceipt, ShippingDetails};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::notify::{NoticeLevel, Notifier};
use crate::profile::{AuthenticatedUser, ProfileField, ProfileStore};
use crate::storage::{KeyValueStore, LocalCartStore};
use crate::sync::{ProfileSync, PullOutcome, SyncOutbox};

/// Where the cart came from at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInSource {
    /// The cloud profile was merged with the device copy.
    Merged,
    /// No cloud profile existed; the device copy was uploaded.
    LocalUploaded,
    /// The cloud profile could not be read; only the device copy is in use.
    LocalOnly,
}

/// Summary of a sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInReport {
    pub source: SignInSource,
    /// Distinct cart lines after sign-in.
    pub cart_lines: usize,
    /// Wishlist entries after sign-in.
    pub wishlist_items: usize,
    /// Fields written to the cloud profile.
    pub pushed: Vec<ProfileField>,
}

/// The shopper's session.
pub struct CartSession<S> {
    local: LocalCartStore<S>,
    notifier: Arc<dyn Notifier>,
    outbox: Option<SyncOutbox>,
    user: Option<AuthenticatedUser>,
    cart: Cart,
    wishlist: Wishlist,
    dark_mode: bool,
}

impl<S: KeyValueStore> CartSession<S> {
    /// Open a session from device storage.
    ///
    /// Entries that fail sanitizing are dropped and the cleaned cart is written
    /// back straight away.
    pub fn open(local: LocalCartStore<S>) -> Self {
        let report = local.load_report();
        let wishlist = local.load_wishlist();
        let dark_mode = local.load_dark_mode();
        let notifier = Arc::clone(local.notifier());

        let mut session = Self {
            local,
            notifier,
            outbox: None,
            user: None,
            cart: report.cart,
            wishlist,
            dark_mode,
        };

        if report.discarded > 0 {
            // Failure is already reported by the store
            let _ = session.local.save(&session.cart);
        }

        debug!(
            cart_lines = session.cart.len(),
            wishlist_items = session.wishlist.len(),
            "Session opened"
        );
        session
    }

    /// Queue cloud pushes through `outbox` while a user is signed in.
    #[must_use]
    pub fn with_outbox(mut self, outbox: SyncOutbox) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// The cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The wishlist.
    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    /// Dark mode preference.
    #[must_use]
    pub const fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    // =========================================================================
    // Line items
    // =========================================================================

    /// Add `quantity` of a product variant to the cart.
    ///
    /// An empty `size` or `color` picks the product's first option, falling
    /// back to [`DEFAULT_SIZE`] and [`DEFAULT_COLOR`]. A quantity of 0 counts as
    /// 1. Returns the index of the affected line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidProduct` if the product has no name or no
    /// price. The cart is unchanged and the shopper is told.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(
        &mut self,
        product: &Product,
        size: Option<&str>,
        color: Option<&str>,
        quantity: u32,
    ) -> Result<usize, CartError> {
        let (name, price) = match (product.name.trim(), product.price) {
            ("", _) => return Err(self.reject(product, "missing name")),
            (_, None) => return Err(self.reject(product, "missing price")),
            (name, Some(price)) => (name.to_string(), price),
        };

        let size = non_empty(size)
            .or_else(|| product.sizes.first().map(String::as_str))
            .unwrap_or(DEFAULT_SIZE);
        let color = non_empty(color)
            .or_else(|| product.colors.first().map(String::as_str))
            .or(product.color.as_deref())
            .unwrap_or(DEFAULT_COLOR);

        let index = self.cart.add(LineItem {
            id: product.id.clone(),
            name: name.clone(),
            price,
            image: product.image.clone(),
            selected_size: Some(size.to_string()),
            selected_color: Some(color.to_string()),
            quantity: quantity.max(1),
            extra: serde_json::Map::new(),
        });

        self.persist_cart();
        let product_id = product.id.to_string();
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product_id.as_str()), ("size", size)]),
        );
        self.notifier
            .notify(NoticeLevel::Success, &format!("{name} added to cart!"));
        Ok(index)
    }

    /// Change the quantity of the line at `index` by `delta`, never below 1.
    /// Returns `false` without changing anything if there is no such line.
    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, index: usize, delta: i64) -> bool {
        let Some(quantity) = self.cart.update_quantity(index, delta) else {
            debug!(lines = self.cart.len(), "No cart line at index, ignoring");
            return false;
        };
        debug!(quantity, "Quantity updated");
        self.persist_cart();
        add_breadcrumb("cart", "Updated quantity", None);
        true
    }

    /// Remove the line at `index`. Returns `None` without changing anything if
    /// there is no such line.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, index: usize) -> Option<LineItem> {
        let Some(removed) = self.cart.remove(index) else {
            debug!(lines = self.cart.len(), "No cart line at index, ignoring");
            return None;
        };
        self.persist_cart();
        let product_id = removed.id.to_string();
        add_breadcrumb("cart", "Removed item", Some(&[("product_id", product_id.as_str())]));
        self.notifier.notify(
            NoticeLevel::Info,
            &format!("{} removed from cart", removed.name),
        );
        Some(removed)
    }

    /// Save or unsave a product. Returns whether it is saved afterwards.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn toggle_wishlist(&mut self, product: &Product) -> bool {
        let saved = self.wishlist.toggle(&product.id);
        // Failure is already reported by the store
        let _ = self.local.save_wishlist(&self.wishlist);
        self.push(ProfileField::Wishlist);

        let message = if saved {
            format!("{} added to wishlist", product.name)
        } else {
            format!("{} removed from wishlist", product.name)
        };
        self.notifier.notify(NoticeLevel::Info, &message);
        saved
    }

    /// Change the dark mode preference. Returns whether it was saved.
    pub fn set_dark_mode(&mut self, enabled: bool) -> bool {
        self.dark_mode = enabled;
        self.local.save_dark_mode(enabled).is_ok()
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Sign a user in and reconcile the device cart and wishlist with their
    /// cloud profile.
    ///
    /// The profile is created on first sign-in. When it can be read, both
    /// copies are merged (see [`merge`]) and every field whose merged value
    /// differs from the cloud copy is pushed. When it cannot, the session
    /// keeps the device copy.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn sign_in<P: ProfileStore>(
        &mut self,
        user: AuthenticatedUser,
        sync: &ProfileSync<P>,
    ) -> SignInReport {
        set_sentry_user(&user.id, user.email.as_deref());
        add_breadcrumb("auth", "Signed in", None);

        sync.ensure_profile(&user).await;

        let mut pushed = Vec::new();
        let source = match sync.pull(&user.id).await {
            PullOutcome::Found(profile) => {
                let cart = Cart::from_items(merge(profile.cart.items(), self.cart.items()));
                let wishlist = merge_wishlist(&profile.wishlist, &self.wishlist);

                if cart != self.cart {
                    self.cart = cart;
                    let _ = self.local.save(&self.cart);
                }
                if wishlist != self.wishlist {
                    self.wishlist = wishlist;
                    let _ = self.local.save_wishlist(&self.wishlist);
                }

                if self.cart != profile.cart
                    && sync
                        .push(&user.id, ProfileField::Cart, &self.cart.to_json())
                        .await
                {
                    pushed.push(ProfileField::Cart);
                }
                if self.wishlist != profile.wishlist
                    && sync
                        .push(&user.id, ProfileField::Wishlist, &self.wishlist.to_json())
                        .await
                {
                    pushed.push(ProfileField::Wishlist);
                }
                SignInSource::Merged
            }
            PullOutcome::NotFound => {
                if sync
                    .push(&user.id, ProfileField::Cart, &self.cart.to_json())
                    .await
                {
                    pushed.push(ProfileField::Cart);
                }
                if sync
                    .push(&user.id, ProfileField::Wishlist, &self.wishlist.to_json())
                    .await
                {
                    pushed.push(ProfileField::Wishlist);
                }
                SignInSource::LocalUploaded
            }
            PullOutcome::Failed(_) => {
                self.notifier.notify(
                    NoticeLevel::Info,
                    "Could not load your saved cart. Showing items from this device.",
                );
                SignInSource::LocalOnly
            }
        };

        info!(
            ?source,
            cart_lines = self.cart.len(),
            wishlist_items = self.wishlist.len(),
            "Signed in"
        );
        self.user = Some(user);

        SignInReport {
            source,
            cart_lines: self.cart.len(),
            wishlist_items: self.wishlist.len(),
            pushed,
        }
    }

    /// Forget the signed-in user. Device data stays.
    pub fn sign_out(&mut self) -> Option<AuthenticatedUser> {
        let user = self.user.take();
        if let Some(user) = &user {
            info!(user_id = %user.id, "Signed out");
            clear_sentry_user();
            add_breadcrumb("auth", "Signed out", None);
        }
        user
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Pay for the cart.
    ///
    /// On success the cart is emptied on the device and in the cloud profile.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn` without a signed-in user,
    /// `CheckoutError::EmptyCart` for an empty cart, or the gateway's error.
    /// The cart is unchanged on error.
    #[instrument(skip_all)]
    pub async fn checkout<G: PaymentGateway>(
        &mut self,
        gateway: &G,
        details: &ShippingDetails,
    ) -> Result<PaymentReceipt, CheckoutError> {
        if self.user.is_none() {
            self.notifier.notify(NoticeLevel::Error, "Please log in to continue.");
            return Err(CheckoutError::NotSignedIn);
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        add_breadcrumb("checkout", "Payment started", None);
        let receipt = gateway.charge(self.cart.subtotal(), details).await?;

        self.cart.clear();
        // Failure is already reported by the store
        let _ = self.local.clear_cart();
        self.push(ProfileField::Cart);
        self.flush().await;

        info!(order_id = %receipt.order_id, amount = %receipt.amount, "Order placed");
        self.notifier.notify(
            NoticeLevel::Success,
            &format!("Order {} confirmed", receipt.order_id),
        );
        Ok(receipt)
    }

    /// Wait for queued cloud pushes to be attempted.
    pub async fn flush(&self) {
        if let Some(outbox) = &self.outbox {
            outbox.flush().await;
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn reject(&self, product: &Product, reason: &'static str) -> CartError {
        warn!(product_id = %product.id, reason, "Rejected invalid product");
        self.notifier.notify(NoticeLevel::Error, "This product is currently unavailable.");
        CartError::InvalidProduct {
            id: product.id.clone(),
            reason,
        }
    }

    fn persist_cart(&mut self) {
        // Failure is already reported by the store
        let _ = self.local.save(&self.cart);
        self.push(ProfileField::Cart);
    }

    /// Queue the current value of `field` for the signed-in user.
    fn push(&self, field: ProfileField) {
        let Some(user) = &self.user else {
            return;
        };
        let Some(outbox) = &self.outbox else {
            debug!(%field, "No sync outbox, keeping change on this device");
            return;
        };
        let value = match field {
            ProfileField::Cart => self.cart.to_json(),
            ProfileField::Wishlist => self.wishlist.to_json(),
        };
        outbox.enqueue(&user.id, field, value);
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
