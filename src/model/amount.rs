//! Amount type for monetary values.
//!
//! `Amount` wraps `Decimal`, parses values that may or may not include a dollar sign and
//! thousands separators, and converts to and from the integer cents stored in SQLite.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Represents a dollar amount.
///
/// # Examples
///
/// ```
/// # use pennypal::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("$1,234.5").unwrap();
/// assert_eq!(a.to_string(), "$1,234.50");
/// assert_eq!(a.cents().unwrap(), 123450);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        value: Decimal::ZERO,
    };

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates an Amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the value rounded to whole cents, half away from zero.
    pub fn cents(&self) -> Result<i64, AmountError> {
        let scaled = (self.value * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled
            .to_i64()
            .ok_or_else(|| AmountError::OutOfRange(self.value.to_string()))
    }

    /// Returns the value rounded to cents, the precision at which amounts are stored.
    pub fn rounded(&self) -> Self {
        Self::new(
            self.value
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn abs(&self) -> Self {
        Self::new(self.value.abs())
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value.is_sign_positive()
    }

    /// Returns true if the amount is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value.is_sign_negative()
    }

    /// The fraction `self / of`, or `None` when `of` is zero.
    pub fn ratio(&self, of: Amount) -> Option<f64> {
        if of.is_zero() {
            return None;
        }
        (self.value / of.value).to_f64()
    }
}

/// An error that can occur when parsing or converting amounts.
pub enum AmountError {
    Parse(rust_decimal::Error),
    OutOfRange(String),
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => Debug::fmt(e, f),
            AmountError::OutOfRange(s) => write!(f, "OutOfRange({s})"),
        }
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => write!(f, "Invalid amount: {e}"),
            AmountError::OutOfRange(s) => write!(f, "Amount {s} is too large to store"),
        }
    }
}

impl Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            AmountError::OutOfRange(_) => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // "-$50.00", "$50.00", "-50.00" and "50.00" are all accepted
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");
        let value = Decimal::from_str(&digits).map_err(AmountError::Parse)?;
        Ok(Amount::new(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        let sign = if rounded.is_negative() { "-" } else { "" };
        let num = rounded.value.abs().to_f64().unwrap_or_default();
        write!(f, "{sign}${}", format_num::format_num!(",.2", num))
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
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
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

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.value + rhs.value)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount::new(self.value - rhs.value)
    }
}

impl Mul<u32> for Amount {
    type Output = Amount;

    fn mul(self, rhs: u32) -> Self::Output {
        Amount::new(self.value * Decimal::from(rhs))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(amount("$50.00").value(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        assert_eq!(amount("-$50.00").value(), Decimal::new(-5000, 2));
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(amount("$1,234,567.89").value(), Decimal::new(123456789, 2));
    }

    #[test]
    fn test_parse_empty_is_zero() {
        assert!(amount("  ").is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("twelve").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(amount("1234.5").to_string(), "$1,234.50");
        assert_eq!(amount("-7.25").to_string(), "-$7.25");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_cents_rounds_half_away_from_zero() {
        assert_eq!(amount("4.505").cents().unwrap(), 451);
        assert_eq!(amount("-4.505").cents().unwrap(), -451);
        assert_eq!(amount("12").cents().unwrap(), 1200);
        assert_eq!(Amount::from_cents(1999).to_string(), "$19.99");
    }

    #[test]
    fn test_sign_predicates() {
        assert!(amount("0.00").is_zero());
        assert!(!amount("0.00").is_positive());
        assert!(!amount("0.00").is_negative());
        assert!(amount("-0.01").is_negative());
        assert!(amount("0.01").is_positive());
    }

    #[test]
    fn test_ratio() {
        assert!((amount("25").ratio(amount("100")).unwrap() - 0.25).abs() < 1e-9);
        assert_eq!(amount("25").ratio(Amount::ZERO), None);
    }

    #[test]
    fn test_arithmetic() {
        let total: Amount = vec![amount("1.10"), amount("2.20")].into_iter().sum();
        assert_eq!(total, amount("3.30"));
        assert_eq!(amount("10") * 4, amount("40"));
        assert_eq!(amount("10") - amount("12.5"), amount("-2.5"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&amount("50")).unwrap();
        assert_eq!(json, "\"$50.00\"");
        let back: Amount = serde_json::from_str("\"-$5,000.00\"").unwrap();
        assert_eq!(back.value(), Decimal::new(-500000, 2));
    }
}
