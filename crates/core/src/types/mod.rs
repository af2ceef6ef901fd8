//! Core value types for the VOGUE storefront.
//!
//! This module provides type-safe wrappers for identifiers, prices and contact
//! email addresses.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
