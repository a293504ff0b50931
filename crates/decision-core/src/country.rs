//! # Country — ISO-3166 Alpha-2 Code
//!
//! Spec §3 requires `country` to be an ISO-3166 alpha-2 code. This module
//! validates the shape (two uppercase ASCII letters) at the boundary; it does
//! not maintain the full ISO-3166 registry — membership in a jurisdiction
//! allowlist is a parameter-store concern (spec §4.C), not a shape concern.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A validated ISO-3166 alpha-2 country code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryCode(String);

/// Error constructing a `CountryCode`.
#[derive(Debug, thiserror::Error)]
#[error("invalid ISO-3166 alpha-2 country code: {0:?}")]
pub struct CountryCodeError(String);

impl CountryCode {
    /// Parse and validate a country code, uppercasing it.
    pub fn new(raw: &str) -> Result<Self, CountryCodeError> {
        let upper = raw.trim().to_uppercase();
        if upper.len() != 2 || !upper.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CountryCodeError(raw.to_string()));
        }
        Ok(Self(upper))
    }

    /// Access the two-letter code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_code() {
        assert_eq!(CountryCode::new("us").unwrap().as_str(), "US");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(CountryCode::new("USA").is_err());
        assert!(CountryCode::new("U").is_err());
    }

    #[test]
    fn rejects_non_alpha() {
        assert!(CountryCode::new("U1").is_err());
    }
}
