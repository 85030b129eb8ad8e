//! Type-safe price representation using decimal arithmetic.
//!
//! Prices travel as plain JSON numbers (the ProductAPI stores them as
//! floats), but all arithmetic on the client happens on [`Decimal`] so that
//! cart totals never accumulate binary rounding error.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A unit or aggregate price in the shop currency (yen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// The zero price, also the total of an empty cart.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest representable amount; arithmetic saturates here.
    pub const MAX: Self = Self(Decimal::MAX);

    /// Currency symbol used when formatting.
    pub const SYMBOL: &'static str = "¥";

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at the largest representable amount instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Like [`Price::times`], but `None` if the result is not representable.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Parse a user-supplied amount such as `"3500"` or `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the input is not a number and
    /// [`PriceError::Negative`] if it is below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        let price = Self(amount);
        if price.is_negative() {
            return Err(PriceError::Negative);
        }
        Ok(price)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Saturating addition.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as `¥1,234` (or `¥1,234.5` when there is a fractional part).
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.0.normalize();
        let text = normalized.abs().to_string();
        let (whole, fraction) = text.split_once('.').map_or((text.as_str(), None), |(w, fr)| (w, Some(fr)));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if normalized.is_sign_negative() && !normalized.is_zero() {
            f.write_str("-")?;
        }
        f.write_str(Self::SYMBOL)?;
        f.write_str(&grouped)?;
        if let Some(fraction) = fraction {
            write!(f, ".{fraction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from(1000).times(2), Price::from(500).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from(3500));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Price = std::iter::empty().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price::new(Decimal::from_scientific("1e20").unwrap());
        assert_eq!(huge.times(u32::MAX), Price::MAX);
        assert_eq!(huge.checked_times(u32::MAX), None);
        assert_eq!(huge.checked_times(2), Some(Price::new(Decimal::from_scientific("2e20").unwrap())));

        assert_eq!(Price::MAX + Price::from(1), Price::MAX);
        let total: Price = [Price::MAX, Price::MAX, Price::from(500)].into_iter().sum();
        assert_eq!(total, Price::MAX);
    }

    #[test]
    fn test_is_negative() {
        assert!(Price::from(-500).is_negative());
        assert!(!Price::ZERO.is_negative());
        assert!(!Price::new(-Decimal::ZERO).is_negative());
        assert!(!Price::from(500).is_negative());
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from(0).to_string(), "¥0");
        assert_eq!(Price::from(999).to_string(), "¥999");
        assert_eq!(Price::from(3500).to_string(), "¥3,500");
        assert_eq!(Price::from(1_234_567).to_string(), "¥1,234,567");
        assert_eq!(Price::parse("1200.50").unwrap().to_string(), "¥1,200.5");
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert!(matches!(Price::parse("cheap"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse(" 1980 ").unwrap(), Price::from(1980));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from(1980)).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Price::from(1980));

        let from_float: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(from_float, Price::parse("19.99").unwrap());

        let from_int: Price = serde_json::from_str("500").unwrap();
        assert_eq!(from_int, Price::from(500));
    }
}
