//! Monetary amounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when an amount no longer fits in a signed 64-bit cent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Amount exceeds the supported range")]
pub struct AmountOverflow;

/// Money amount represented in cents to avoid floating point issues.
///
/// Catalog prices carry two decimal places, so a cent count represents
/// them exactly and doubles as the gateway's minor-unit amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity.
    pub fn checked_multiply(&self, quantity: u32) -> Result<Money, AmountOverflow> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
            .ok_or(AmountOverflow)
    }

    pub fn checked_add(&self, other: Money) -> Result<Money, AmountOverflow> {
        self.cents
            .checked_add(other.cents)
            .map(Money::from_cents)
            .ok_or(AmountOverflow)
    }

    /// Sums amounts, failing instead of wrapping.
    pub fn checked_sum<I>(amounts: I) -> Result<Money, AmountOverflow>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Formats the amount as a plain decimal string, e.g. `"12.34"`.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", self.dollars().abs(), self.cents_part())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}
