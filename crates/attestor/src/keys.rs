//! # Ed25519 Key Types
//!
//! Public keys and signatures as hex-encoded newtypes, plus signing key
//! derivation from a seed. Ported in spirit from `ed25519.rs` in the
//! cryptography crate this workspace grew out of.
//!
//! ## Security Invariant
//!
//! Private key material is never serialized or logged. `SigningKeyPair`
//! does not implement `Serialize` and its `Debug` impl never prints the
//! key bytes.

use decision_core::CryptoError;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// An Ed25519 public (verifying) key, 32 bytes.
///
/// Serializes as a base64-standard string for wire compatibility with the
/// `/keys`, `/pubkey`, and `/sign` HTTP responses (spec §6).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VerifyingKey(pub [u8; 32]);

/// An Ed25519 signature, 64 bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 64]);

impl VerifyingKey {
    /// Render the key as standard base64.
    pub fn to_b64(&self) -> String {
        base64_encode(&self.0)
    }

    /// Parse a key from standard base64.
    pub fn from_b64(s: &str) -> Result<Self, CryptoError> {
        let bytes = base64_decode(s).map_err(|e| CryptoError::KeyError(e))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::KeyError("public key must decode to 32 bytes".into()))?;
        Ok(Self(arr))
    }

    fn to_dalek(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({}...)", &self.to_b64()[..8.min(self.to_b64().len())])
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_b64())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_b64(&s).map_err(serde::de::Error::custom)
    }
}

impl Signature {
    /// Render the signature as standard base64.
    pub fn to_b64(&self) -> String {
        base64_encode(&self.0)
    }

    /// Parse a signature from standard base64.
    pub fn from_b64(s: &str) -> Result<Self, CryptoError> {
        let bytes = base64_decode(s).map_err(|e| CryptoError::VerificationFailed(e))?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::VerificationFailed("signature must decode to 64 bytes".into()))?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", &self.to_b64()[..8.min(self.to_b64().len())])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_b64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_b64(&s).map_err(serde::de::Error::custom)
    }
}

/// A single Ed25519 keypair held by the attestor's keyring.
///
/// Derived deterministically from a configuration seed: the signing key is
/// `SigningKey::from_bytes(SHA-256(seed_bytes))`, matching
/// `services/attestor/app.py`'s `hashlib.sha256(seed.encode()).digest()`
/// so that the same `ATTESTOR_KEYS` configuration always yields the same
/// keys across restarts and across the Rust/Python generations of this
/// system.
pub struct KeyEntry {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyEntry {
    /// Derive a keypair from arbitrary seed bytes.
    pub fn from_seed_bytes(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut seed32 = [0u8; 32];
        seed32.copy_from_slice(&digest);
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&seed32),
        }
    }

    /// Generate a random keypair (used by `cmattest keygen` for fresh seeds).
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// The verifying (public) key for this entry.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes, producing a raw detached signature.
    ///
    /// Accepts only `&decision_core::CanonicalBytes` — callers cannot sign
    /// raw, non-canonicalized bytes.
    pub fn sign(&self, data: &decision_core::CanonicalBytes) -> Signature {
        let sig = self.signing_key.sign(data.as_bytes());
        Signature(sig.to_bytes())
    }

    /// Sign an arbitrary byte string (the JWS `header.payload` signing
    /// input, which is already base64url-encoded and thus not itself a
    /// candidate for JCS canonicalization).
    pub fn sign_raw(&self, data: &[u8]) -> Signature {
        let sig = self.signing_key.sign(data);
        Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyEntry(<private>, pub={})", self.verifying_key().to_b64())
    }
}

/// Verify a detached signature over canonical bytes.
pub fn verify(
    data: &decision_core::CanonicalBytes,
    signature: &Signature,
    key: &VerifyingKey,
) -> Result<(), CryptoError> {
    let vk = key.to_dalek()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

/// Verify a detached signature over a raw byte string (JWS signing input).
pub fn verify_raw(data: &[u8], signature: &Signature, key: &VerifyingKey) -> Result<(), CryptoError> {
    let vk = key.to_dalek()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data, &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// base64 (standard, padded) — no external base64 crate dependency beyond
// what's already pulled in transitively; implemented directly to keep the
// attestor's dependency surface minimal, matching msez-crypto's ed25519.rs
// precedent of a small hand-rolled hex codec for the same reason.
// ---------------------------------------------------------------------------

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        let n = ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32);
        out.push(ALPHABET[((n >> 18) & 0x3f) as usize] as char);
        out.push(ALPHABET[((n >> 12) & 0x3f) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[((n >> 6) & 0x3f) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(n & 0x3f) as usize] as char } else { '=' });
    }
    out
}

fn base64_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim_end_matches('=');
    let mut buf = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(s.len() * 3 / 4 + 3);
    for c in s.bytes() {
        let val = ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| format!("invalid base64 byte: {c}"))? as u32;
        buf = (buf << 6) | val;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buf >> bits) as u8);
        }
    }
    Ok(out)
}

/// Base64url (no padding) encode, used for JWS segments.
pub fn b64url_encode(bytes: &[u8]) -> String {
    base64_encode(bytes)
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string()
}

/// Base64url (no padding) decode, used for JWS segments.
pub fn b64url_decode(s: &str) -> Result<Vec<u8>, String> {
    let padded = s.replace('-', "+").replace('_', "/");
    base64_decode(&padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use decision_core::CanonicalBytes;

    #[test]
    fn base64_roundtrip() {
        let input = b"hello world, this is a test of the base64 codec!";
        let encoded = base64_encode(input);
        let decoded = base64_decode(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn b64url_roundtrip_no_padding() {
        let input = b"\x00\x01\x02\x03";
        let encoded = b64url_encode(input);
        assert!(!encoded.contains('='));
        let decoded = b64url_decode(&encoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn deterministic_from_seed() {
        let a = KeyEntry::from_seed_bytes(b"demo-seed-change-me");
        let b = KeyEntry::from_seed_bytes(b"demo-seed-change-me");
        assert_eq!(a.verifying_key().to_b64(), b.verifying_key().to_b64());
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let key = KeyEntry::from_seed_bytes(b"seed-1");
        let data = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let sig = key.sign(&data);
        verify(&data, &sig, &key.verifying_key()).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let key = KeyEntry::from_seed_bytes(b"seed-2");
        let data = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let tampered = CanonicalBytes::new(&serde_json::json!({"x": 2})).unwrap();
        let sig = key.sign(&data);
        assert!(verify(&tampered, &sig, &key.verifying_key()).is_err());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let key_a = KeyEntry::from_seed_bytes(b"seed-a");
        let key_b = KeyEntry::from_seed_bytes(b"seed-b");
        let data = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let sig = key_a.sign(&data);
        assert!(verify(&data, &sig, &key_b.verifying_key()).is_err());
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let key = KeyEntry::from_seed_bytes(b"seed-3");
        let debug = format!("{key:?}");
        assert!(!debug.contains("SigningKey"));
        assert!(debug.starts_with("KeyEntry(<private>"));
    }
}
