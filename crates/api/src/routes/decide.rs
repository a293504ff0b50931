//! `POST /decide` — the Decision Engine's single external entry point
//! (spec §4.C, §6). Grounded on `services/decider/app.py`'s `/decide`
//! route: reads an optional `Idempotency-Key` header, delegates
//! everything else to the engine.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use decision_engine::DecideRequest;

use crate::error::AppError;
use crate::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

pub async fn decide(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DecideRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let response = state.engine.decide(&request, idempotency_key).await?;
    Ok(Json(serde_json::to_value(response).map_err(|e| {
        AppError::Internal(format!("failed to serialize decision response: {e}"))
    })?))
}
