//! Amount - Non-negative decimal wrapper for monetary amounts
//!
//! Rule bounds, thresholds and costs are never negative.
//! Transaction amounts must additionally be strictly positive.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount must be greater than zero: {0}")]
    NotPositive(Decimal),
}

/// A non-negative decimal amount.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use pulse_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Negative amounts are rejected
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
///
/// // Transaction amounts must be strictly positive
/// assert!(Amount::positive(Decimal::ZERO).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            Err(AmountError::NegativeAmount(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create an Amount that must be strictly greater than zero.
    pub fn positive(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            Err(AmountError::NotPositive(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create an Amount from a whole number of units
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns None if the result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_zero_allowed_by_new() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(Decimal::new(-100, 0));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert!(matches!(
            Amount::positive(Decimal::ZERO),
            Err(AmountError::NotPositive(_))
        ));
        assert!(matches!(
            Amount::positive(Decimal::new(-1, 2)),
            Err(AmountError::NotPositive(_))
        ));
        assert_eq!(
            Amount::positive(Decimal::new(1, 2)).unwrap().value(),
            Decimal::new(1, 2)
        );
    }

    #[test]
    fn test_from_units() {
        assert_eq!(Amount::from_units(10_000).value(), Decimal::new(10_000, 0));
    }

    #[test]
    fn test_checked_sub() {
        let a = Amount::new(Decimal::new(100, 0)).unwrap();
        let b = Amount::new(Decimal::new(30, 0)).unwrap();
        assert_eq!(a.checked_sub(&b).unwrap().value(), Decimal::new(70, 0));
        assert!(b.checked_sub(&a).is_none());
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-5\"");
        assert!(parsed.is_err());

        let parsed: Amount = serde_json::from_str("\"123.45\"").unwrap();
        assert_eq!(parsed.value(), Decimal::new(12345, 2));
    }
}
