//! `GET /healthz` — liveness only, no downstream checks. Mirrors
//! `services/control/app.py`'s `/healthz` and `msez-api`'s
//! `liveness()` handler.

use axum::Json;
use serde_json::{json, Value};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}
