//! Parameter-store routes — `/param/hash` (public), `/params` (public
//! snapshot), `/param/threshold` and `/param/allowlist` (admin-gated
//! mutations). Grounded on `services/control/app.py`'s `/param/hash`,
//! `/param/threshold`, and `/param/allowlist` routes; the bearer-token
//! gate on the two mutating routes is this crate's [`crate::auth`]
//! extractor in place of the Python service's raw string comparison.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use decision_core::CountryCode;

use crate::auth::AdminIdentity;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ParamHashResponse {
    pub param_hash: String,
}

pub async fn param_hash(State(state): State<AppState>) -> Result<Json<ParamHashResponse>, AppError> {
    let param_hash = state.params.param_hash().await?;
    Ok(Json(ParamHashResponse { param_hash }))
}

#[derive(Serialize)]
pub struct ParamsSnapshotResponse {
    pub thresholds: Vec<(String, Decimal)>,
    pub allowlist: Vec<String>,
    pub param_hash: String,
}

pub async fn params_snapshot(
    State(state): State<AppState>,
) -> Result<Json<ParamsSnapshotResponse>, AppError> {
    let snapshot = state.params.snapshot().await?;
    Ok(Json(ParamsSnapshotResponse {
        thresholds: snapshot
            .thresholds()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        allowlist: snapshot.allowlist().map(|c| c.to_string()).collect(),
        param_hash: snapshot.param_hash(),
    }))
}

#[derive(Deserialize)]
pub struct SetThresholdRequest {
    pub k: String,
    pub v: Decimal,
}

#[derive(Serialize)]
pub struct MutationResponse {
    pub param_hash: String,
}

/// `POST /param/threshold` — admin-gated. The [`AdminIdentity`] extractor
/// rejects the request before this body runs if the bearer token is
/// missing or wrong.
pub async fn set_threshold(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Json(req): Json<SetThresholdRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let param_hash = state.params.set_threshold(&req.k, req.v).await?;
    Ok(Json(MutationResponse { param_hash }))
}

#[derive(Deserialize)]
pub struct SetAllowlistRequest {
    pub country: String,
    pub action: AllowlistAction,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowlistAction {
    Add,
    Remove,
}

/// `POST /param/allowlist` — admin-gated.
pub async fn set_allowlist(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Json(req): Json<SetAllowlistRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let country = CountryCode::new(&req.country)
        .map_err(|e| AppError::BadRequest(format!("invalid country code: {e}")))?;
    let allow = matches!(req.action, AllowlistAction::Add);
    let param_hash = state.params.set_allowlist(&country, allow).await?;
    Ok(Json(MutationResponse { param_hash }))
}
