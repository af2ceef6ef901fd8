//! VOGUE Storefront library.
//!
//! Everything between the shopper's cart and the outside world: device
//! storage, the Firestore user profile, the product catalog and the mocked
//! checkout. [`session::CartSession`] ties them together.
//!
//! # Modules
//!
//! - [`storage`] - Key-value stores and the local cart store
//! - [`profile`] - User profile documents in Firestore or memory
//! - [`sync`] - Profile push/pull and the background sync outbox
//! - [`catalog`] - Cached product listing and seeding
//! - [`checkout`] - Shipping details and payment gateway
//! - [`session`] - The shopper's cart session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod firestore;
pub mod notify;
pub mod profile;
pub mod session;
pub mod storage;
pub mod sync;
