//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` enforces the canonicalization requirement from spec §3:
//! ISO8601 with Z suffix, microseconds omitted. Serializing a `Timestamp`
//! never produces sub-second precision, so the canonical bundle pipeline
//! never has to special-case timestamp formatting.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A UTC-only timestamp, truncated to whole-seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        let now = Utc::now();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Parse an RFC 3339 / ISO 8601 string, converting any offset to UTC and
    /// truncating sub-second precision.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc);
        Ok(Self::from_utc(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO8601 with Z suffix (e.g. `2025-09-16T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Whether this timestamp falls on a Saturday or Sunday, UTC.
    ///
    /// Implements the weekend guard boundary rule from spec §4.B: the
    /// weekday/weekend split is evaluated on the UTC calendar day of `ts`.
    pub fn is_weekend_utc(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_sub_seconds() {
        let ts = Timestamp::parse("2025-09-16T12:00:00.999123Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-09-16T12:00:00Z");
    }

    #[test]
    fn converts_offsets_to_utc() {
        let ts = Timestamp::parse("2025-09-16T14:00:00+02:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-09-16T12:00:00Z");
    }

    #[test]
    fn weekday_is_not_weekend() {
        // 2025-09-16 is a Tuesday.
        let ts = Timestamp::parse("2025-09-16T12:00:00Z").unwrap();
        assert!(!ts.is_weekend_utc());
    }

    #[test]
    fn sunday_is_weekend() {
        // 2025-09-14 is a Sunday.
        let ts = Timestamp::parse("2025-09-14T13:00:00Z").unwrap();
        assert!(ts.is_weekend_utc());
    }

    #[test]
    fn saturday_is_weekend() {
        // 2025-09-20 is a Saturday.
        let ts = Timestamp::parse("2025-09-20T00:00:01Z").unwrap();
        assert!(ts.is_weekend_utc());
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::parse("2025-09-16T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#""2025-09-16T12:00:00Z""#);
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
