//! # Amount — Decimal, Non-Negative Monetary Value
//!
//! Spec §3 requires `amount` to be a non-negative decimal. Canonicalization
//! (spec §9) rejects floats outright, so `Amount` wraps `rust_decimal::Decimal`
//! and serializes as a JSON string — never a JSON number — keeping it off the
//! float-rejection path in `CanonicalBytes::new()` by construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A non-negative decimal monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

/// Error constructing an `Amount`.
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    /// The amount was negative.
    #[error("amount must be non-negative, got {0}")]
    Negative(Decimal),
    /// The input could not be parsed as a decimal.
    #[error("invalid decimal amount: {0}")]
    Parse(String),
}

impl Amount {
    /// Construct an `Amount`, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Access the inner decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s).map_err(|e| AmountError::Parse(e.to_string()))?;
        Self::new(d)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept both string and number wire forms from clients, but the
        // canonical path always re-serializes as a string (see module docs).
        let value = serde_json::Value::deserialize(deserializer)?;
        let decimal = match value {
            serde_json::Value::String(s) => {
                Decimal::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?
            }
            serde_json::Value::Number(n) => {
                Decimal::from_str(&n.to_string()).map_err(|e| serde::de::Error::custom(e.to_string()))?
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "amount must be a string or number, got {other}"
                )))
            }
        };
        Self::new(decimal).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative() {
        assert!(Amount::new(Decimal::from(-1)).is_err());
    }

    #[test]
    fn accepts_zero() {
        assert!(Amount::new(Decimal::from(0)).is_ok());
    }

    #[test]
    fn serializes_as_string() {
        let amt = Amount::from_str("100.00").unwrap();
        let json = serde_json::to_string(&amt).unwrap();
        assert_eq!(json, r#""100.00""#);
    }

    #[test]
    fn deserializes_from_number() {
        let amt: Amount = serde_json::from_str("2800.00").unwrap();
        assert_eq!(amt.to_string(), "2800.00");
    }

    #[test]
    fn deserializes_negative_number_fails() {
        let result: Result<Amount, _> = serde_json::from_str("-5");
        assert!(result.is_err());
    }
}
