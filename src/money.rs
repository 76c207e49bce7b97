//! Money types
//!
//! Balances and transfer amounts are integer minor units. Floating point is
//! never used, so repeated transfers cannot drift.
//!
//! ## Enforcement
//! - [`Balance`] is never negative: construction is checked and fields are private
//! - [`Amount`] is always strictly positive
//! - Mutations go through [`Balance::debit`] / [`Balance::credit`], which
//!   return a new value and leave the original untouched on error
//!
//! ```ignore
//! let balance = Balance::new(45_000)?;
//! let amount = Amount::new(15_000)?;
//! let after = balance.debit(amount)?;
//! assert_eq!(after.minor_units(), 30_000);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Money rule violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Balance cannot be negative")]
    NegativeBalance,

    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Insufficient balance")]
    Insufficient,

    #[error("Balance would overflow")]
    Overflow,
}

/// Non-negative account balance in minor units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub const fn new(minor_units: i64) -> Result<Self, MoneyError> {
        if minor_units < 0 {
            return Err(MoneyError::NegativeBalance);
        }
        Ok(Self(minor_units))
    }

    #[inline(always)]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Balance after removing `amount`.
    ///
    /// # Errors
    /// - `Insufficient` if the balance is below `amount`
    pub fn debit(self, amount: Amount) -> Result<Self, MoneyError> {
        if self.0 < amount.0 {
            return Err(MoneyError::Insufficient);
        }
        self.0
            .checked_sub(amount.0)
            .map(Self)
            .ok_or(MoneyError::Insufficient)
    }

    /// Balance after adding `amount`.
    ///
    /// # Errors
    /// - `Overflow` if the result does not fit in `i64`
    pub fn credit(self, amount: Amount) -> Result<Self, MoneyError> {
        self.0
            .checked_add(amount.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let raw = i64::deserialize(deserializer)?;
        Balance::new(raw).map_err(D::Error::custom)
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly positive transfer amount in minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const fn new(minor_units: i64) -> Result<Self, MoneyError> {
        if minor_units <= 0 {
            return Err(MoneyError::NonPositiveAmount);
        }
        Ok(Self(minor_units))
    }

    #[inline(always)]
    pub const fn minor_units(self) -> i64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let raw = i64::deserialize(deserializer)?;
        Amount::new(raw).map_err(D::Error::custom)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
