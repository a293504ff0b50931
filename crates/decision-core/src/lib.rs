//! # decision-core — Foundational Types for the Attestation Decision Stack
//!
//! This crate is the bedrock of the stack. Every other crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All signing and digest computation flows
//!    through `CanonicalBytes::new()`. No raw `serde_json::to_vec()` on the
//!    signed path, ever. This makes the "signed something other than the
//!    canonical bundle" defect class impossible by construction.
//!
//! 2. **UTC-only timestamps.** `Timestamp` enforces UTC with Z suffix and
//!    seconds precision, matching the canonicalization rule in spec §3.
//!
//! 3. **Non-float amounts.** `Amount` wraps `rust_decimal::Decimal` and
//!    serializes as a JSON string, so monetary values never trip the
//!    float-rejection path.
//!
//! 4. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that all digest paths flow through canonicalization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other crates in this workspace (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod country;
pub mod digest;
pub mod error;
pub mod temporal;

pub use amount::{Amount, AmountError};
pub use canonical::CanonicalBytes;
pub use country::{CountryCode, CountryCodeError};
pub use digest::{sha256_digest, sha256_hex, sha256_raw_hex, ContentDigest};
pub use error::{CanonicalizationError, CryptoError};
pub use temporal::Timestamp;
