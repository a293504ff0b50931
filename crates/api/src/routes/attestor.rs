//! Attestor routes — `/keys`, `/pubkey`, `/sign`, `/verify`,
//! `/sign_jws`, `/verify_jws` (spec §6). Grounded on
//! `services/attestor/app.py`, which exposes the exact same six
//! operations over the exact same JSON shapes.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use attestor::jws::CompactJws;
use attestor::keys::{Signature, VerifyingKey};
use decision_core::{sha256_hex, CanonicalBytes, CryptoError};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct KeysResponse {
    pub active: String,
    pub keys: BTreeMap<String, VerifyingKey>,
}

pub async fn list_keys(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse {
        active: state.attestor.active_kid().to_string(),
        keys: state.attestor.list_keys().into_iter().collect(),
    })
}

#[derive(Serialize)]
pub struct PubkeyResponse {
    pub public_key_b64: String,
}

pub async fn pubkey(State(state): State<AppState>) -> Json<PubkeyResponse> {
    Json(PubkeyResponse {
        public_key_b64: state.attestor.active_public_key().to_b64(),
    })
}

#[derive(Deserialize)]
pub struct SignRequest {
    pub bundle: Value,
}

#[derive(Serialize)]
pub struct SignResponse {
    pub signature_b64: String,
    pub public_key_b64: String,
    pub digest_hex: String,
    pub kid: String,
}

pub async fn sign(
    State(state): State<AppState>,
    Json(req): Json<SignRequest>,
) -> Result<Json<SignResponse>, AppError> {
    let canonical = CanonicalBytes::new(&req.bundle)
        .map_err(|e| AppError::BadRequest(format!("bundle is not canonicalizable: {e}")))?;
    let signed = state.attestor.sign_bundle(&canonical);
    Ok(Json(SignResponse {
        signature_b64: signed.signature.to_b64(),
        public_key_b64: state.attestor.active_public_key().to_b64(),
        digest_hex: sha256_hex(&canonical),
        kid: signed.kid,
    }))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub bundle: Value,
    pub signature_b64: String,
    pub kid: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let canonical = CanonicalBytes::new(&req.bundle)
        .map_err(|e| AppError::BadRequest(format!("bundle is not canonicalizable: {e}")))?;
    let kid = req.kid.unwrap_or_else(|| state.attestor.active_kid().to_string());

    let signature = match Signature::from_b64(&req.signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            return Ok(Json(VerifyResponse {
                valid: false,
                kid: Some(kid),
                reason: Some(e.to_string()),
            }))
        }
    };

    match state.attestor.verify_bundle(&canonical, &signature, &kid) {
        Ok(()) => Ok(Json(VerifyResponse { valid: true, kid: Some(kid), reason: None })),
        Err(CryptoError::UnknownKid(_)) => Ok(Json(VerifyResponse {
            valid: false,
            kid: Some(kid),
            reason: Some("unknown_kid".to_string()),
        })),
        Err(_) => Ok(Json(VerifyResponse { valid: false, kid: Some(kid), reason: None })),
    }
}

#[derive(Deserialize)]
pub struct SignJwsRequest {
    pub payload: Value,
}

#[derive(Serialize)]
pub struct SignJwsResponse {
    pub kid: String,
    pub jws: String,
}

pub async fn sign_jws(
    State(state): State<AppState>,
    Json(req): Json<SignJwsRequest>,
) -> Result<Json<SignJwsResponse>, AppError> {
    let canonical = CanonicalBytes::new(&req.payload)
        .map_err(|e| AppError::BadRequest(format!("payload is not canonicalizable: {e}")))?;
    let jws = state.attestor.sign_certificate(&canonical)?;
    Ok(Json(SignJwsResponse {
        kid: jws.peek_kid().unwrap_or_default(),
        jws: jws.to_compact_string(),
    }))
}

#[derive(Deserialize)]
pub struct VerifyJwsRequest {
    pub jws: String,
}

#[derive(Serialize)]
pub struct VerifyJwsResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

pub async fn verify_jws(
    State(state): State<AppState>,
    Json(req): Json<VerifyJwsRequest>,
) -> Result<Json<VerifyJwsResponse>, AppError> {
    let jws = match CompactJws::parse(&req.jws) {
        Ok(jws) => jws,
        Err(_) => return Ok(Json(VerifyJwsResponse { valid: false, kid: None, payload: None })),
    };
    let kid = jws.peek_kid().ok();

    match state.attestor.verify_certificate(&jws) {
        Ok(bytes) => {
            let payload: Option<Value> = serde_json::from_slice(&bytes).ok();
            Ok(Json(VerifyJwsResponse { valid: true, kid, payload }))
        }
        Err(_) => Ok(Json(VerifyJwsResponse { valid: false, kid, payload: None })),
    }
}

/// Public-key-only view used by the offline verifier: a `kid -> base64
/// public key` map, the exact shape `tools/verify_cert.py` fetches from
/// `/keys`.
pub fn public_keys_map(state: &AppState) -> BTreeMap<String, VerifyingKey> {
    state.attestor.list_keys().into_iter().collect()
}
