//! Vogue Core - cart reconciliation and shared types.
//!
//! This crate holds the pure logic shared by every Vogue component:
//! - `storefront` - Device storage, profile sync and cart sessions
//! - `cli` - Command-line storefront for local use and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Sanitizing and merging carts can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`cart`] - Line items, carts, wishlists, sanitizing and merging
//! - [`catalog`] - Products and listing filters

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use cart::{Cart, CartError, LineItem, LineKey, Wishlist, merge, merge_wishlist, sanitize};
pub use catalog::{Product, ProductFilter, SortOrder};
pub use types::*;
