//! # Error Types — Shared Error Hierarchy
//!
//! Defines the error types shared across crates in the attestation decision
//! stack. All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// JCS encoding failed.
    #[error("jcs encoding failed: {0}")]
    JcsFailed(String),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Unknown key identifier.
    #[error("unknown kid: {0}")]
    UnknownKid(String),

    /// Digest computation failed.
    #[error("digest error: {0}")]
    DigestError(String),
}
