//! Mocked checkout.
//!
//! No money moves: [`MockGateway`] waits a fixed delay and approves every
//! charge. The checkout flow itself lives on
//! [`CartSession::checkout`](crate::session::CartSession::checkout).

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

use vogue_core::{Email, EmailError, OrderId};

/// Default simulated payment delay.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(2500);

/// Errors that can end a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No user is signed in.
    #[error("Please log in to continue")]
    NotSignedIn,

    /// The cart has no items.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A shipping field is missing.
    #[error("Missing {0}")]
    InvalidDetails(&'static str),

    /// The contact email is invalid.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The gateway refused the charge.
    #[error("Payment declined: {0}")]
    Declined(String),
}

/// Shipping form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl ShippingDetails {
    /// Validate a shipping form. Every field is required.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidDetails` naming the first empty field,
    /// or `CheckoutError::InvalidEmail` if the email does not parse.
    pub fn new(
        full_name: &str,
        email: &str,
        address: &str,
        city: &str,
        postal_code: &str,
    ) -> Result<Self, CheckoutError> {
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(CheckoutError::InvalidDetails(field))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(Self {
            full_name: required(full_name, "full name")?,
            email: Email::parse(email)?,
            address: required(address, "address")?,
            city: required(city, "city")?,
            postal_code: required(postal_code, "postal code")?,
        })
    }
}

/// A completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Takes payment for an order.
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` for an order shipped to `details`.
    fn charge(
        &self,
        amount: Decimal,
        details: &ShippingDetails,
    ) -> impl Future<Output = Result<PaymentReceipt, CheckoutError>> + Send;
}

/// Gateway that approves every charge after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct MockGateway {
    delay: Duration,
}

impl MockGateway {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

impl PaymentGateway for MockGateway {
    #[instrument(skip(self, details), fields(email = %details.email))]
    async fn charge(
        &self,
        amount: Decimal,
        details: &ShippingDetails,
    ) -> Result<PaymentReceipt, CheckoutError> {
        tokio::time::sleep(self.delay).await;
        let receipt = PaymentReceipt {
            order_id: OrderId::generate(),
            amount,
            paid_at: Utc::now(),
        };
        info!(order_id = %receipt.order_id, %amount, "Payment approved");
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_details_validation() {
        let details = ShippingDetails::new(
            " Ada Lovelace ",
            "ada@vogue.example",
            "12 Analytical Row",
            "London",
            "N1 9GU",
        )
        .unwrap();
        assert_eq!(details.full_name, "Ada Lovelace");

        assert!(matches!(
            ShippingDetails::new("Ada", "ada@vogue.example", "", "London", "N1"),
            Err(CheckoutError::InvalidDetails("address"))
        ));
        assert!(matches!(
            ShippingDetails::new("Ada", "not-an-email", "12 Row", "London", "N1"),
            Err(CheckoutError::InvalidEmail(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_gateway_waits_then_approves() {
        let details =
            ShippingDetails::new("Ada", "ada@vogue.example", "12 Row", "London", "N1").unwrap();
        let started = tokio::time::Instant::now();

        let receipt = MockGateway::default()
            .charge(Decimal::new(42500, 2), &details)
            .await
            .unwrap();

        assert!(started.elapsed() >= DEFAULT_PAYMENT_DELAY);
        assert_eq!(receipt.amount, Decimal::new(42500, 2));
        assert!(receipt.order_id.as_str().starts_with("VG-"));
    }
}
