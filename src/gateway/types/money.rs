//! Amount input at the API boundary
//!
//! Clients send `amount` as a JSON number or a numeric string. The raw value
//! is kept as a `Decimal` so the handler can tell "missing", "not a positive
//! number" and "not a whole number" apart, in that order, before anything
//! reaches the engine.

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, de};

use crate::money::Amount;
use crate::transfer::TransferError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountInput {
    Number(Decimal),
    /// Present but not a number (`"abc"`, `""`, `"1e5"`, ...)
    Unparsable,
}

impl AmountInput {
    /// Convert to a transfer amount in minor units.
    pub fn to_amount(&self) -> Result<Amount, TransferError> {
        let AmountInput::Number(d) = self else {
            return Err(TransferError::MalformedAmount);
        };
        if *d <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount);
        }
        if !d.fract().is_zero() {
            return Err(TransferError::MalformedAmount);
        }
        let units = d.to_i64().ok_or(TransferError::MalformedAmount)?;
        Amount::new(units).map_err(|_| TransferError::InvalidAmount)
    }
}

fn parse_strict(s: &str) -> AmountInput {
    let s = s.trim();
    if s.is_empty()
        || s.starts_with('.')
        || s.ends_with('.')
        || s.starts_with('+')
        || s.contains(['e', 'E'])
    {
        return AmountInput::Unparsable;
    }
    Decimal::from_str(s)
        .map(AmountInput::Number)
        .unwrap_or(AmountInput::Unparsable)
}

struct AmountVisitor;

impl de::Visitor<'_> for AmountVisitor {
    type Value = AmountInput;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(AmountInput::Number(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(AmountInput::Number(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Decimal::from_f64(v)
            .map(AmountInput::Number)
            .unwrap_or(AmountInput::Unparsable))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_strict(v))
    }
}

impl<'de> Deserialize<'de> for AmountInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AmountInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_accepts_number_and_string() {
        assert_eq!(parse("15000").to_amount().unwrap().minor_units(), 15_000);
        assert_eq!(parse(r#""15000""#).to_amount().unwrap().minor_units(), 15_000);
        assert_eq!(parse("15000.0").to_amount().unwrap().minor_units(), 15_000);
    }

    #[test]
    fn test_non_positive() {
        assert_eq!(parse("0").to_amount(), Err(TransferError::InvalidAmount));
        assert_eq!(parse("-5").to_amount(), Err(TransferError::InvalidAmount));
        assert_eq!(parse(r#""-1.5""#).to_amount(), Err(TransferError::InvalidAmount));
    }

    #[test]
    fn test_fractional_rejected() {
        assert_eq!(parse("10.5").to_amount(), Err(TransferError::MalformedAmount));
        assert_eq!(parse(r#""0.01""#).to_amount(), Err(TransferError::MalformedAmount));
    }

    #[test]
    fn test_unparsable_strings() {
        for raw in [r#""""#, r#""abc""#, r#"".5""#, r#""5.""#, r#""1e5""#, r#""+5""#] {
            assert_eq!(parse(raw), AmountInput::Unparsable, "{raw}");
            assert_eq!(parse(raw).to_amount(), Err(TransferError::MalformedAmount));
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            parse("18446744073709551615").to_amount(),
            Err(TransferError::MalformedAmount)
        );
    }

    #[test]
    fn test_wrong_json_type_is_a_parse_error() {
        assert!(serde_json::from_str::<AmountInput>("true").is_err());
        assert!(serde_json::from_str::<AmountInput>("[1]").is_err());
    }
}
