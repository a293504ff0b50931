//! # attestor — Ed25519 Signing Service for Decision Certificates
//!
//! Wraps a [`Keyring`] with the two signing surfaces the rest of the stack
//! needs: detached signatures over canonical bytes (used for the bundle
//! digest and for the internal attestor HTTP API's `/sign`/`/verify`), and
//! compact JWS envelopes (used for the outer decision certificate and the
//! `/sign_jws`/`/verify_jws` routes).
//!
//! Grounded on `msez-crypto`'s `ed25519.rs` (key/signature newtypes and
//! sign/verify functions) and `services/attestor/app.py` (the
//! `ATTESTOR_KEYS` configuration grammar and the `/keys`, `/sign`,
//! `/verify`, `/sign_jws`, `/verify_jws` operation contracts).
//!
//! ## Crate Policy
//!
//! - Depends only on `decision-core` internally.
//! - No `unsafe` code.
//! - Private key material never implements `Serialize` or a leaky `Debug`.

pub mod jws;
pub mod keyring;
pub mod keys;

pub use jws::{sign as sign_jws, verify as verify_jws, verify_with_public_keys, CompactJws};
pub use keyring::{Keyring, KeyringError, ALG_ED25519};
pub use keys::{KeyEntry, Signature, VerifyingKey};

use decision_core::{CanonicalBytes, CryptoError};

/// A signed bundle: the `kid` that produced the signature and the detached
/// signature itself, ready to embed in a decision certificate's envelope
/// metadata alongside the canonical bundle bytes.
#[derive(Debug, Clone)]
pub struct BundleSignature {
    pub kid: String,
    pub signature: Signature,
}

/// High-level facade over a [`Keyring`] offering the exact operations the
/// Decision Engine and the attestor HTTP API need, so callers never touch
/// `Keyring`'s lower-level rotation/listing methods directly in the hot
/// signing path.
pub struct Attestor {
    keyring: Keyring,
}

impl Attestor {
    /// Build an attestor from an already-parsed keyring.
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }

    /// Build an attestor directly from the `ATTESTOR_KEYS` environment
    /// variable grammar.
    pub fn from_env_str(raw: &str) -> Result<Self, KeyringError> {
        Ok(Self::new(Keyring::from_env_str(raw)?))
    }

    /// The `kid` newly issued signatures and certificates carry.
    pub fn active_kid(&self) -> &str {
        self.keyring.active_kid()
    }

    /// List every configured public key, in `kid` order — the data behind
    /// the `/keys` route.
    pub fn list_keys(&self) -> Vec<(String, VerifyingKey)> {
        self.keyring.list_public_keys()
    }

    /// The active signing key's public key alone — the data behind the
    /// `/pubkey` route.
    pub fn active_public_key(&self) -> VerifyingKey {
        self.keyring
            .public_key(self.keyring.active_kid())
            .expect("active_kid always resolves")
    }

    /// Sign canonical bytes with the active key, producing a detached
    /// bundle signature.
    pub fn sign_bundle(&self, data: &CanonicalBytes) -> BundleSignature {
        let (kid, signature) = self.keyring.sign_active(data);
        BundleSignature { kid, signature }
    }

    /// Verify a detached bundle signature against the named `kid`,
    /// regardless of whether that key is currently active.
    pub fn verify_bundle(
        &self,
        data: &CanonicalBytes,
        signature: &Signature,
        kid: &str,
    ) -> Result<(), CryptoError> {
        self.keyring.verify_with_kid(kid, data, signature)
    }

    /// Sign canonical bundle bytes into a compact JWS decision certificate
    /// envelope.
    pub fn sign_certificate(&self, bundle: &CanonicalBytes) -> Result<CompactJws, CryptoError> {
        jws::sign(&self.keyring, bundle)
    }

    /// Verify a compact JWS decision certificate, returning the decoded
    /// canonical bundle bytes on success.
    pub fn verify_certificate(&self, jws: &CompactJws) -> Result<Vec<u8>, CryptoError> {
        jws::verify(&self.keyring, jws)
    }

    /// Rotate the active signing key. The target `kid` must already be
    /// present (added via [`Attestor::add_key`]); old keys remain
    /// verifiable indefinitely.
    pub fn rotate_to(&mut self, kid: &str) -> Result<(), CryptoError> {
        self.keyring.rotate_to(kid)
    }

    /// Add a new key without changing which one is active.
    pub fn add_key(&mut self, kid: String, entry: KeyEntry) -> Result<(), KeyringError> {
        self.keyring.add_key(kid, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_certificate_lifecycle() {
        let attestor = Attestor::from_env_str("ed25519:k1:seed-one").unwrap();
        let bundle = CanonicalBytes::new(&serde_json::json!({
            "decision": "PASS",
            "decided_at": "2026-07-27T12:00:00Z",
        }))
        .unwrap();

        let cert = attestor.sign_certificate(&bundle).unwrap();
        let decoded = attestor.verify_certificate(&cert).unwrap();
        assert_eq!(decoded, bundle.as_bytes());

        // Tampering any byte of the payload breaks verification (spec §8,
        // scenario 6).
        let mut tampered = cert.clone();
        let mut chars: Vec<char> = tampered.payload.chars().collect();
        chars[0] = if chars[0] == 'A' { 'Z' } else { 'A' };
        tampered.payload = chars.into_iter().collect();
        assert!(attestor.verify_certificate(&tampered).is_err());
    }

    #[test]
    fn rotation_keeps_old_signatures_verifiable() {
        let mut attestor = Attestor::from_env_str("ed25519:k1:seed-one").unwrap();
        let bundle = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let sig = attestor.sign_bundle(&bundle);
        assert_eq!(sig.kid, "k1");

        attestor
            .add_key("k2".to_string(), KeyEntry::from_seed_bytes(b"seed-two"))
            .unwrap();
        attestor.rotate_to("k2").unwrap();
        assert_eq!(attestor.active_kid(), "k2");

        attestor.verify_bundle(&bundle, &sig.signature, &sig.kid).unwrap();

        let sig2 = attestor.sign_bundle(&bundle);
        assert_eq!(sig2.kid, "k2");
    }

    #[test]
    fn list_keys_includes_all_configured_kids() {
        let attestor = Attestor::from_env_str("ed25519:k1:seed-one;ed25519:k2:seed-two").unwrap();
        let kids: Vec<String> = attestor.list_keys().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kids, vec!["k1".to_string(), "k2".to_string()]);
        assert_eq!(attestor.active_kid(), "k2");
    }
}
