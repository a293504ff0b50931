//! # Keyring
//!
//! Holds every configured Ed25519 key entry, keyed by `kid`, plus a pointer
//! to the currently active signing key. Rotation is additive: a new `kid`
//! is added and `active_kid` is swapped atomically, but every previously
//! configured key is retained so that certificates signed under retired
//! keys remain verifiable (spec §4.A, "key rotation does not invalidate
//! previously issued certificates").
//!
//! Configuration is read from the `ATTESTOR_KEYS` environment variable,
//! mirroring `services/attestor/app.py`'s bootstrap: a `;`-separated list
//! of `alg:kid:seed` triples, e.g. `ed25519:k1:seed-one;ed25519:k2:seed-two`.
//! The last entry in the list becomes `active_kid`.

use crate::keys::{KeyEntry, Signature, VerifyingKey};
use decision_core::{CanonicalBytes, CryptoError};
use std::collections::BTreeMap;

/// The supported signature algorithm identifier, used in both the
/// `ATTESTOR_KEYS` config grammar and the JWS `alg` header.
pub const ALG_ED25519: &str = "ed25519";

/// A keyring of Ed25519 key entries with one designated active key.
pub struct Keyring {
    entries: BTreeMap<String, KeyEntry>,
    active_kid: String,
}

/// Error parsing or constructing a keyring.
#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    /// `ATTESTOR_KEYS` was empty or unset.
    #[error("ATTESTOR_KEYS must configure at least one key")]
    Empty,
    /// An entry did not match the `alg:kid:seed` grammar.
    #[error("malformed key entry {0:?}, expected alg:kid:seed")]
    Malformed(String),
    /// An entry named an unsupported algorithm.
    #[error("unsupported signing algorithm {0:?}, only {ALG_ED25519:?} is supported")]
    UnsupportedAlg(String),
    /// Two entries declared the same `kid`.
    #[error("duplicate kid {0:?} in ATTESTOR_KEYS")]
    DuplicateKid(String),
}

impl Keyring {
    /// Parse a keyring from the `ATTESTOR_KEYS` grammar:
    /// `alg:kid:seed;alg:kid:seed;...`. The last entry becomes active.
    pub fn from_env_str(raw: &str) -> Result<Self, KeyringError> {
        let mut entries = BTreeMap::new();
        let mut last_kid = None;

        for part in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let mut fields = part.splitn(3, ':');
            let (alg, kid, seed) = match (fields.next(), fields.next(), fields.next()) {
                (Some(alg), Some(kid), Some(seed)) => (alg, kid, seed),
                _ => return Err(KeyringError::Malformed(part.to_string())),
            };
            if alg != ALG_ED25519 {
                return Err(KeyringError::UnsupportedAlg(alg.to_string()));
            }
            if entries.contains_key(kid) {
                return Err(KeyringError::DuplicateKid(kid.to_string()));
            }
            entries.insert(kid.to_string(), KeyEntry::from_seed_bytes(seed.as_bytes()));
            last_kid = Some(kid.to_string());
        }

        let active_kid = last_kid.ok_or(KeyringError::Empty)?;
        Ok(Self { entries, active_kid })
    }

    /// Build a keyring directly from entries (used by tests and `cmattest
    /// keygen`), with an explicit active kid.
    pub fn from_entries(entries: BTreeMap<String, KeyEntry>, active_kid: String) -> Result<Self, KeyringError> {
        if !entries.contains_key(&active_kid) {
            return Err(KeyringError::Malformed(format!(
                "active_kid {active_kid:?} not present in entries"
            )));
        }
        Ok(Self { entries, active_kid })
    }

    /// The `kid` of the key newly issued signatures use.
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Rotate to a newly added key. The new key must already be present in
    /// the keyring (added via `add_key`); this only swaps the pointer,
    /// matching the additive-rotation invariant.
    pub fn rotate_to(&mut self, kid: &str) -> Result<(), CryptoError> {
        if !self.entries.contains_key(kid) {
            return Err(CryptoError::UnknownKid(kid.to_string()));
        }
        self.active_kid = kid.to_string();
        Ok(())
    }

    /// Add a new key entry without changing which key is active.
    pub fn add_key(&mut self, kid: String, entry: KeyEntry) -> Result<(), KeyringError> {
        if self.entries.contains_key(&kid) {
            return Err(KeyringError::DuplicateKid(kid));
        }
        self.entries.insert(kid, entry);
        Ok(())
    }

    /// List every configured `kid` and its public key, in `kid` order.
    pub fn list_public_keys(&self) -> Vec<(String, VerifyingKey)> {
        self.entries
            .iter()
            .map(|(kid, entry)| (kid.clone(), entry.verifying_key()))
            .collect()
    }

    /// Fetch the public key for a given `kid`.
    pub fn public_key(&self, kid: &str) -> Result<VerifyingKey, CryptoError> {
        self.entries
            .get(kid)
            .map(KeyEntry::verifying_key)
            .ok_or_else(|| CryptoError::UnknownKid(kid.to_string()))
    }

    /// Sign canonical bytes with the active key. Returns the `kid` used and
    /// the raw detached signature.
    pub fn sign_active(&self, data: &CanonicalBytes) -> (String, Signature) {
        let entry = self
            .entries
            .get(&self.active_kid)
            .expect("active_kid always refers to a present entry");
        (self.active_kid.clone(), entry.sign(data))
    }

    /// Sign raw bytes (JWS signing input) with the active key.
    pub fn sign_raw_active(&self, data: &[u8]) -> (String, Signature) {
        let entry = self
            .entries
            .get(&self.active_kid)
            .expect("active_kid always refers to a present entry");
        (self.active_kid.clone(), entry.sign_raw(data))
    }

    /// Verify a detached signature against the key identified by `kid`,
    /// whether or not that key is currently active.
    pub fn verify_with_kid(
        &self,
        kid: &str,
        data: &CanonicalBytes,
        signature: &Signature,
    ) -> Result<(), CryptoError> {
        let key = self.public_key(kid)?;
        crate::keys::verify(data, signature, &key)
    }

    /// Verify a raw-bytes signature (JWS) against the key identified by `kid`.
    pub fn verify_raw_with_kid(&self, kid: &str, data: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let key = self.public_key(kid)?;
        crate::keys::verify_raw(data, signature, &key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_key() {
        let kr = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        assert_eq!(kr.active_kid(), "k1");
        assert_eq!(kr.list_public_keys().len(), 1);
    }

    #[test]
    fn last_entry_is_active() {
        let kr = Keyring::from_env_str("ed25519:k1:seed-one;ed25519:k2:seed-two").unwrap();
        assert_eq!(kr.active_kid(), "k2");
        assert_eq!(kr.list_public_keys().len(), 2);
    }

    #[test]
    fn rejects_empty_config() {
        assert!(matches!(Keyring::from_env_str(""), Err(KeyringError::Empty)));
    }

    #[test]
    fn rejects_malformed_entry() {
        assert!(matches!(
            Keyring::from_env_str("ed25519:k1"),
            Err(KeyringError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unsupported_alg() {
        assert!(matches!(
            Keyring::from_env_str("rsa:k1:seed"),
            Err(KeyringError::UnsupportedAlg(_))
        ));
    }

    #[test]
    fn rejects_duplicate_kid() {
        assert!(matches!(
            Keyring::from_env_str("ed25519:k1:seed-a;ed25519:k1:seed-b"),
            Err(KeyringError::DuplicateKid(_))
        ));
    }

    #[test]
    fn rotation_is_additive_old_key_still_verifies() {
        let mut kr = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let data = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let (kid_used, sig) = kr.sign_active(&data);
        assert_eq!(kid_used, "k1");

        kr.add_key("k2".into(), KeyEntry::from_seed_bytes(b"seed-two")).unwrap();
        kr.rotate_to("k2").unwrap();
        assert_eq!(kr.active_kid(), "k2");

        // Signature minted under k1, before rotation, still verifies.
        kr.verify_with_kid("k1", &data, &sig).unwrap();
    }

    #[test]
    fn rotate_to_unknown_kid_fails() {
        let mut kr = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        assert!(matches!(kr.rotate_to("ghost"), Err(CryptoError::UnknownKid(_))));
    }

    #[test]
    fn verify_with_unknown_kid_fails() {
        let kr = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let data = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let (_, sig) = kr.sign_active(&data);
        assert!(matches!(
            kr.verify_with_kid("ghost", &data, &sig),
            Err(CryptoError::UnknownKid(_))
        ));
    }
}
