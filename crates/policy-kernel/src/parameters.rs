//! # Parameters — the Kernel's Input Snapshot
//!
//! A `Parameters` value is the entire configurable surface the kernel
//! reads: a threshold table (`k -> v`, decimal-valued) and a country
//! allowlist. `param_hash` is the canonical digest of this snapshot —
//! mutating any threshold or allowlist entry changes it; reverting
//! restores the original hash bitwise (spec §8).

use decision_core::{sha256_hex, CanonicalBytes, CountryCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Threshold key for the amount ceiling (spec §4.B rule 1).
pub const KEY_AMOUNT_MAX: &str = "amount_max";
/// Threshold key for the recent-activity hard-escalation bound (spec §4.B
/// rule 4). Not named in spec.md's threshold grammar, but the kernel needs
/// a concrete bound to implement "higher `recent` never improves a
/// decision" — exposed as an ordinary threshold so the control plane can
/// tune it the same way as `amount_max`.
pub const KEY_RECENT_ESCALATION: &str = "recent_escalation";

/// A versioned snapshot of kernel parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    thresholds: BTreeMap<String, Decimal>,
    allowlist: BTreeSet<String>,
}

impl Parameters {
    /// A reasonable default snapshot: a 2000.00 amount ceiling, a handful
    /// of allowlisted jurisdictions, and escalation to `HOLD_HUMAN` once
    /// `recent >= 5`.
    pub fn defaults() -> Self {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(KEY_AMOUNT_MAX.to_string(), Decimal::from_str("2000.00").unwrap());
        thresholds.insert(KEY_RECENT_ESCALATION.to_string(), Decimal::from(5));

        let allowlist = ["US", "CA", "GB", "DE", "FR"]
            .into_iter()
            .map(str::to_string)
            .collect();

        Self { thresholds, allowlist }
    }

    /// Build an empty snapshot (no thresholds, no allowlisted countries) —
    /// mainly useful for tests that want full control over every value.
    pub fn empty() -> Self {
        Self {
            thresholds: BTreeMap::new(),
            allowlist: BTreeSet::new(),
        }
    }

    /// Read a threshold value, if set.
    pub fn threshold(&self, key: &str) -> Option<Decimal> {
        self.thresholds.get(key).copied()
    }

    /// Upsert a threshold value — the `POST /param/threshold` operation.
    pub fn set_threshold(&mut self, key: impl Into<String>, value: Decimal) {
        self.thresholds.insert(key.into(), value);
    }

    /// Whether a country is allowlisted.
    pub fn allows_country(&self, country: &CountryCode) -> bool {
        self.allowlist.contains(country.as_str())
    }

    /// Add a country to the allowlist — the `POST /param/allowlist
    /// {action:"add"}` operation.
    pub fn allow_country(&mut self, country: &CountryCode) {
        self.allowlist.insert(country.as_str().to_string());
    }

    /// Remove a country from the allowlist — the `POST /param/allowlist
    /// {action:"remove"}` operation.
    pub fn disallow_country(&mut self, country: &CountryCode) {
        self.allowlist.remove(country.as_str());
    }

    /// All allowlisted countries, sorted.
    pub fn allowlist(&self) -> impl Iterator<Item = &str> {
        self.allowlist.iter().map(String::as_str)
    }

    /// All configured thresholds.
    pub fn thresholds(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.thresholds.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The deterministic hash of this snapshot: `SHA-256` over the JCS
    /// canonicalization of `{thresholds, allowlist}`. Sensitive to every
    /// threshold and allowlist entry; insensitive to insertion order
    /// (both fields are sorted maps/sets).
    pub fn param_hash(&self) -> String {
        let bytes = CanonicalBytes::new(self).expect("Parameters contains no floats, always canonicalizes");
        sha256_hex(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allowlist_includes_us_not_ru() {
        let params = Parameters::defaults();
        assert!(params.allows_country(&CountryCode::new("US").unwrap()));
        assert!(!params.allows_country(&CountryCode::new("RU").unwrap()));
    }

    #[test]
    fn param_hash_changes_on_threshold_mutation_and_reverts() {
        let mut params = Parameters::defaults();
        let original = params.param_hash();

        params.set_threshold(KEY_AMOUNT_MAX, Decimal::from_str("2001.00").unwrap());
        let mutated = params.param_hash();
        assert_ne!(original, mutated);

        params.set_threshold(KEY_AMOUNT_MAX, Decimal::from_str("2000.00").unwrap());
        let reverted = params.param_hash();
        assert_eq!(original, reverted);
    }

    #[test]
    fn param_hash_changes_on_allowlist_mutation_and_reverts() {
        let mut params = Parameters::defaults();
        let original = params.param_hash();
        let ru = CountryCode::new("RU").unwrap();

        params.allow_country(&ru);
        assert_ne!(params.param_hash(), original);

        params.disallow_country(&ru);
        assert_eq!(params.param_hash(), original);
    }

    #[test]
    fn param_hash_is_deterministic() {
        let params = Parameters::defaults();
        assert_eq!(params.param_hash(), params.param_hash());
    }
}
