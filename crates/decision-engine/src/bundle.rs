//! # Bundle & Certificate Payload Shapes
//!
//! Spec §3: the exact field sets signed, in the order canonicalization
//! requires (canonicalization itself sorts keys; field order here is for
//! readability only). Two distinct shapes share an `Inputs` struct:
//!
//! - [`Bundle`] is what gets raw-signed and whose bytes feed `proof_id`.
//! - [`CertificatePayload`] is the richer JWS payload, which additionally
//!   carries `sub` and `proof_id` itself (spec §3, "Certificate").

use decision_core::{Amount, CountryCode};
use serde::{Deserialize, Serialize};

/// The request inputs embedded in both the bundle and the certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inputs {
    pub amount: Amount,
    pub country: CountryCode,
    pub recent: u32,
}

/// The canonical, raw-signed bundle (spec §3, "Bundle").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub ts: String,
    pub decision: String,
    pub obligations: Vec<String>,
    pub kernel_id: String,
    pub param_hash: String,
    pub inputs: Inputs,
}

/// The JWS certificate payload (spec §3, "Certificate").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificatePayload {
    pub sub: String,
    pub ts: String,
    pub decision: String,
    pub kernel_id: String,
    pub param_hash: String,
    pub inputs: Inputs,
    pub obligations: Vec<String>,
    pub proof_id: String,
}
