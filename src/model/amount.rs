//! Amount type for handling monetary values sent by the backend as decimal strings.
//!
//! This module provides the `Amount` type which wraps `Decimal`. The backend sends amounts and
//! balances as strings (e.g. `"1250.00"`). Parsing is strict via `FromStr`, but deserialization is
//! lenient: a value that cannot be parsed becomes zero so that a single bad record never breaks a
//! whole listing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// Represents a monetary amount or balance.
///
/// # Examples
///
/// Strict parsing:
/// ```
/// # use finboard::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "1250.50");
/// assert!(Amount::from_str("12 dollars").is_err());
/// ```
///
/// Lenient parsing, used when reading backend records:
/// ```
/// # use finboard::model::Amount;
/// assert!(Amount::lenient("not a number").is_zero());
/// assert_eq!(Amount::lenient(" 40 ").to_f64(), 40.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Parses `s`, falling back to zero for anything that is not a finite decimal.
    pub fn lenient(s: &str) -> Self {
        match Amount::from_str(s) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Treating unparseable amount '{s}' as zero: {e}");
                Amount::default()
            }
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the value clamped at zero. Transaction amounts are non-negative by contract, a
    /// negative one is counted as zero rather than flipping the direction of money.
    pub fn non_negative(&self) -> Decimal {
        if self.value.is_sign_negative() {
            Decimal::ZERO
        } else {
            self.value
        }
    }

    /// Returns the value as a float, for display and chart output.
    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or_default()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Formats the amount with thousands separators and two decimals, e.g. `1,250.50`.
    pub fn display_with_commas(&self) -> String {
        format_money(self.to_f64())
    }
}

/// Formats a float as money with thousands separators, e.g. `-1,250.50`.
pub fn format_money(value: f64) -> String {
    format_num::format_num!(",.2", value)
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Remove commas (thousand separators)
        let without_commas = trimmed.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount { value })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Some backends send numbers rather than strings, accept both.
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(s) => Amount::lenient(&s),
            serde_json::Value::Number(n) => Amount::lenient(&n.to_string()),
            _ => Amount::default(),
        })
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
