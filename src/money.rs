//! Fixed-point money type counted in whole cents.
//!
//! All ledger arithmetic happens on integer cents. Decimal values only appear
//! at the edges: parsing input, printing output, and (de)serialization.

use crate::error::{LedgerError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount with exactly two decimal places, stored as cents.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use split_ledger::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.cents(), 1050);
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// The number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(0);

    /// Creates an amount from a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal to money, rounding to the nearest cent
    /// (midpoints away from zero).
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        value
            .round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
            .ok_or_else(|| LedgerError::AmountOutOfRange(value.to_string()))
    }

    /// Returns the amount as a two-decimal `Decimal`.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::SCALE)
    }

    /// Returns the amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Addition that returns `None` instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Subtraction that returns `None` instead of overflowing.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed).map_err(|e| LedgerError::InvalidAmount {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        Money::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts both JSON strings (`"12.50"`) and numbers (`12.5`).
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decimal = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_decimal(decimal).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(money("1").to_string(), "1.00");
        assert_eq!(money("1.5").to_string(), "1.50");
        assert_eq!(money("  2.25  ").to_string(), "2.25");
        assert_eq!(money("99").cents(), 9900);
    }

    #[test]
    fn test_from_str_rounds_to_nearest_cent() {
        assert_eq!(money("3.335").cents(), 334);
        assert_eq!(money("3.334").cents(), 333);
        assert_eq!(money("-3.335").cents(), -334);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(matches!(
            Money::from_str("ten"),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_from_decimal_out_of_range() {
        assert!(matches!(
            Money::from_decimal(Decimal::MAX),
            Err(LedgerError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_negative_display() {
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_arithmetic() {
        let a = money("1.5");
        let b = money("2.5");

        assert_eq!((a + b).to_string(), "4.00");
        assert_eq!((a - b).to_string(), "-1.00");
        assert_eq!((-a).cents(), -150);
        assert_eq!([a, b, b].iter().sum::<Money>(), money("6.5"));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = money("90000000000000000.00");

        assert_eq!(big.checked_add(big), None);
        assert_eq!((-big).checked_sub(big), None);
        assert_eq!(big.checked_sub(big), Some(Money::ZERO));
        assert_eq!(money("1").checked_add(money("0.5")), Some(money("1.5")));
    }

    #[test]
    fn test_serde_accepts_strings_and_numbers() {
        let parsed: Vec<Money> = serde_json::from_str(r#"["12.50", 33.33, 7]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Money::from_cents(1250), Money::from_cents(3333), Money::from_cents(700)]
        );

        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, r#""12.50""#);
    }
}
