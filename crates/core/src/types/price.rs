//! Non-negative prices using decimal arithmetic.
//!
//! Prices arrive from two loosely typed sources (cart records persisted on the
//! device and documents read from the store), so parsing accepts either a JSON
//! number or a numeric string. Pricing is single-currency.

use core::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The value is not a number or a numeric string.
    #[error("price is not numeric: {0}")]
    NotNumeric(String),
    /// The value is a number but not a finite one.
    #[error("price is not finite")]
    NotFinite,
    /// The value is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative, finite price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from whole currency units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Coerce a JSON value into a price.
    ///
    /// Numbers are taken as-is. Strings are read up to the end of their leading
    /// decimal literal, so `"12.50 EUR"` is 12.50 and `"1e3"` is 1000, while a
    /// string that does not start with a number is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric values, non-finite numbers and negative
    /// amounts.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PriceError> {
        let amount = match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Decimal::from(i)
                } else if let Some(u) = n.as_u64() {
                    Decimal::from(u)
                } else {
                    let f = n.as_f64().ok_or(PriceError::NotFinite)?;
                    Decimal::try_from(f).map_err(|_| PriceError::NotFinite)?
                }
            }
            serde_json::Value::String(s) => leading_decimal(s.trim())?,
            other => return Err(PriceError::NotNumeric(other.to_string())),
        };
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, PriceError> {
    if s.is_empty() {
        return Err(PriceError::NotNumeric(String::new()));
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| PriceError::NotNumeric(s.to_owned()))
}

/// Parse the longest decimal literal at the start of `s`.
fn leading_decimal(s: &str) -> Result<Decimal, PriceError> {
    let not_numeric = || PriceError::NotNumeric(s.to_owned());
    let mut chars = s.chars().peekable();

    let mut literal = String::new();
    if chars.next_if(|&c| matches!(c, '+' | '-')) == Some('-') {
        literal.push('-');
    }
    let whole = take_digits(&mut chars);
    let fraction = if chars.next_if_eq(&'.').is_some() {
        take_digits(&mut chars)
    } else {
        String::new()
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(not_numeric());
    }
    literal.push_str(if whole.is_empty() { "0" } else { &whole });
    if !fraction.is_empty() {
        literal.push('.');
        literal.push_str(&fraction);
    }

    // An exponent only counts when digits follow it.
    if chars.next_if(|&c| matches!(c, 'e' | 'E')).is_some() {
        let negative = chars.next_if(|&c| matches!(c, '+' | '-')) == Some('-');
        let digits = take_digits(&mut chars);
        if !digits.is_empty() {
            let sign = if negative { "-" } else { "" };
            return Decimal::from_scientific(&format!("{literal}e{sign}{digits}"))
                .map_err(|_| PriceError::NotFinite);
        }
    }
    Decimal::from_str(&literal).map_err(|_| not_numeric())
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(parse_decimal(s.trim())?)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Whole amounts stay integers so records keep the shape they were read with.
        if self.0.fract().is_zero()
            && let Some(i) = self.0.to_i64()
        {
            return serializer.serialize_i64(i);
        }
        match self.0.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_price_from_number() {
        assert_eq!(Price::from_json(&json!(425)).unwrap(), Price::from_units(425));
        assert_eq!(
            Price::from_json(&json!(19.99)).unwrap().amount(),
            Decimal::new(1999, 2)
        );
    }

    #[test]
    fn test_price_from_numeric_string() {
        assert_eq!(
            Price::from_json(&json!(" 12.50 ")).unwrap().amount(),
            Decimal::new(1250, 2)
        );
        assert_eq!(Price::from_json(&json!("1e3")).unwrap(), Price::from_units(1000));
    }

    #[test]
    fn test_price_string_reads_leading_literal() {
        let read = |s: &str| Price::from_json(&json!(s)).unwrap().amount();
        assert_eq!(read("12abc"), Decimal::from(12));
        assert_eq!(read("12.50 EUR"), Decimal::new(1250, 2));
        assert_eq!(read(".5"), Decimal::new(5, 1));
        assert_eq!(read("+7."), Decimal::from(7));
        assert_eq!(read("2e2x"), Decimal::from(200));
        assert_eq!(read("3e"), Decimal::from(3));
        assert!(matches!(
            Price::from_json(&json!("-4kg")),
            Err(PriceError::Negative(_))
        ));
        assert!(matches!(
            Price::from_json(&json!("$12")),
            Err(PriceError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_price_from_str_is_strict() {
        assert!("12abc".parse::<Price>().is_err());
        assert_eq!("12".parse::<Price>().unwrap(), Price::from_units(12));
    }

    #[test]
    fn test_price_rejects_garbage() {
        assert!(matches!(
            Price::from_json(&json!("abc")),
            Err(PriceError::NotNumeric(_))
        ));
        assert!(matches!(
            Price::from_json(&json!("")),
            Err(PriceError::NotNumeric(_))
        ));
        assert!(Price::from_json(&json!(null)).is_err());
        assert!(Price::from_json(&json!(true)).is_err());
        assert!(Price::from_json(&json!([1])).is_err());
    }

    #[test]
    fn test_price_rejects_negative() {
        assert!(matches!(
            Price::from_json(&json!(-1)),
            Err(PriceError::Negative(_))
        ));
        assert!(matches!(
            Price::from_json(&json!("-0.01")),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_price_zero_is_valid() {
        assert_eq!(Price::from_json(&json!(0)).unwrap(), Price::ZERO);
        assert_eq!(Price::from_json(&json!("-0")).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_price_serializes_whole_amounts_as_integers() {
        assert_eq!(serde_json::to_string(&Price::from_units(890)).unwrap(), "890");
        let cents = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&cents).unwrap(), "19.99");
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_units(425).to_string(), "$425.00");
    }

    #[test]
    fn test_price_times() {
        assert_eq!(Price::from_units(10).times(3), Decimal::from(30));
    }
}
