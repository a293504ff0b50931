//! # JWS — Compact Serialization (RFC 7515) for Decision Certificates
//!
//! A decision certificate's outer envelope is a compact JWS:
//! `base64url(header) + "." + base64url(payload) + "." + base64url(signature)`,
//! with `alg: "EdDSA"`. The payload is the canonical bundle bytes; the
//! signing input is the ASCII string `header_b64 + "." + payload_b64`,
//! matching `tools/verify_cert.py`'s verification routine byte for byte.
//!
//! This module only ever signs the *canonicalized* bundle — payload bytes
//! are produced once via `CanonicalBytes::new()` and reused unchanged for
//! both the JWS payload segment and the caller's stored `canonical_bundle`.

use crate::keyring::Keyring;
use crate::keys::{b64url_decode, b64url_encode, Signature};
use decision_core::{CanonicalBytes, CryptoError};
use serde::{Deserialize, Serialize};

/// The JWS protected header. Only `EdDSA` is ever produced; `typ` is fixed
/// to `"JWT"` for compatibility with generic JWS/JWT tooling even though
/// the payload is not itself a JWT claims set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: String,
    kid: String,
    typ: String,
}

/// A parsed compact JWS, with each segment available both decoded and in
/// its original base64url form (the original form is authoritative for
/// re-verifying the signature).
#[derive(Debug, Clone)]
pub struct CompactJws {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl CompactJws {
    /// Render as the `header.payload.signature` compact string.
    pub fn to_compact_string(&self) -> String {
        format!("{}.{}.{}", self.header, self.payload, self.signature)
    }

    /// Parse a compact JWS string into its three segments.
    pub fn parse(s: &str) -> Result<Self, CryptoError> {
        let mut parts = s.split('.');
        let (header, payload, signature, extra) = (parts.next(), parts.next(), parts.next(), parts.next());
        match (header, payload, signature, extra) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => Ok(Self {
                header: h.to_string(),
                payload: p.to_string(),
                signature: s.to_string(),
            }),
            _ => Err(CryptoError::VerificationFailed(
                "malformed JWS: expected exactly three non-empty dot-separated segments".into(),
            )),
        }
    }

    /// Decode and parse the protected header's `kid` field without
    /// verifying the signature — used by verifiers to look up the
    /// corresponding public key before checking the signature.
    pub fn peek_kid(&self) -> Result<String, CryptoError> {
        let header_bytes =
            b64url_decode(&self.header).map_err(|e| CryptoError::VerificationFailed(format!("bad header: {e}")))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|e| CryptoError::VerificationFailed(format!("bad header json: {e}")))?;
        Ok(header.kid)
    }

    /// Decode the payload segment back into raw canonical bundle bytes.
    pub fn decode_payload(&self) -> Result<Vec<u8>, CryptoError> {
        b64url_decode(&self.payload).map_err(|e| CryptoError::VerificationFailed(format!("bad payload: {e}")))
    }
}

/// Sign canonical bundle bytes into a compact JWS using the keyring's
/// currently active key.
pub fn sign(keyring: &Keyring, payload: &CanonicalBytes) -> Result<CompactJws, CryptoError> {
    let kid = keyring.active_kid().to_string();
    let header = Header {
        alg: "EdDSA".to_string(),
        kid: kid.clone(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| CryptoError::VerificationFailed(format!("header serialization failed: {e}")))?;
    let header_b64 = b64url_encode(&header_json);
    let payload_b64 = b64url_encode(payload.as_bytes());

    let signing_input = format!("{header_b64}.{payload_b64}");
    let (signing_kid, signature) = keyring.sign_raw_active(signing_input.as_bytes());
    debug_assert_eq!(signing_kid, kid);

    let signature_b64 = b64url_encode(&signature.0);

    Ok(CompactJws {
        header: header_b64,
        payload: payload_b64,
        signature: signature_b64,
    })
}

/// Verify a compact JWS against the keyring, returning the decoded payload
/// bytes on success. Rejects unknown `kid`s and any tampering of either
/// segment.
pub fn verify(keyring: &Keyring, jws: &CompactJws) -> Result<Vec<u8>, CryptoError> {
    let kid = jws.peek_kid()?;
    let signing_input = format!("{}.{}", jws.header, jws.payload);
    let signature_bytes = b64url_decode(&jws.signature)
        .map_err(|e| CryptoError::VerificationFailed(format!("bad signature segment: {e}")))?;
    let sig_arr: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| CryptoError::VerificationFailed("signature must decode to 64 bytes".into()))?;
    let signature = Signature(sig_arr);

    keyring.verify_raw_with_kid(&kid, signing_input.as_bytes(), &signature)?;
    jws.decode_payload()
}

/// Verify a compact JWS using only a set of known public keys (no signing
/// capability required) — the shape used by offline verification, where
/// the caller has fetched `/keys` once and has no access to private
/// material.
pub fn verify_with_public_keys(
    keys: &std::collections::BTreeMap<String, crate::keys::VerifyingKey>,
    jws: &CompactJws,
) -> Result<Vec<u8>, CryptoError> {
    let kid = jws.peek_kid()?;
    let key = keys.get(&kid).ok_or_else(|| CryptoError::UnknownKid(kid.clone()))?;
    let signing_input = format!("{}.{}", jws.header, jws.payload);
    let signature_bytes = b64url_decode(&jws.signature)
        .map_err(|e| CryptoError::VerificationFailed(format!("bad signature segment: {e}")))?;
    let sig_arr: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| CryptoError::VerificationFailed("signature must decode to 64 bytes".into()))?;
    let signature = Signature(sig_arr);

    crate::keys::verify_raw(signing_input.as_bytes(), &signature, key)?;
    jws.decode_payload()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::Keyring;

    #[test]
    fn sign_and_verify_roundtrip() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"decision": "PASS"})).unwrap();
        let jws = sign(&keyring, &payload).unwrap();
        let decoded = verify(&keyring, &jws).unwrap();
        assert_eq!(decoded, payload.as_bytes());
    }

    #[test]
    fn header_carries_active_kid() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one;ed25519:k2:seed-two").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let jws = sign(&keyring, &payload).unwrap();
        assert_eq!(jws.peek_kid().unwrap(), "k2");
    }

    #[test]
    fn tampering_payload_byte_fails_verification() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let mut jws = sign(&keyring, &payload).unwrap();
        // Flip one character in the payload segment.
        let mut chars: Vec<char> = jws.payload.chars().collect();
        let i = 0;
        chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
        jws.payload = chars.into_iter().collect();
        assert!(verify(&keyring, &jws).is_err());
    }

    #[test]
    fn tampering_header_byte_fails_verification() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let mut jws = sign(&keyring, &payload).unwrap();
        let mut chars: Vec<char> = jws.header.chars().collect();
        let i = 0;
        chars[i] = if chars[i] == 'e' { 'f' } else { 'e' };
        jws.header = chars.into_iter().collect();
        assert!(jws.peek_kid().is_err() || verify(&keyring, &jws).is_err());
    }

    #[test]
    fn verify_rejects_unknown_kid() {
        let signer = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let verifier = Keyring::from_env_str("ed25519:k2:seed-two").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let jws = sign(&signer, &payload).unwrap();
        assert!(matches!(verify(&verifier, &jws), Err(CryptoError::UnknownKid(_))));
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        assert!(CompactJws::parse("a.b").is_err());
        assert!(CompactJws::parse("a.b.c.d").is_err());
        assert!(CompactJws::parse("").is_err());
    }

    #[test]
    fn compact_string_roundtrips_through_parse() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let jws = sign(&keyring, &payload).unwrap();
        let s = jws.to_compact_string();
        let reparsed = CompactJws::parse(&s).unwrap();
        assert_eq!(verify(&keyring, &reparsed).unwrap(), payload.as_bytes());
    }

    #[test]
    fn verify_with_public_keys_matches_keyring_verify() {
        let keyring = Keyring::from_env_str("ed25519:k1:seed-one").unwrap();
        let payload = CanonicalBytes::new(&serde_json::json!({"x": 1})).unwrap();
        let jws = sign(&keyring, &payload).unwrap();

        let mut keys = std::collections::BTreeMap::new();
        for (kid, key) in keyring.list_public_keys() {
            keys.insert(kid, key);
        }
        let decoded = verify_with_public_keys(&keys, &jws).unwrap();
        assert_eq!(decoded, payload.as_bytes());
    }
}
