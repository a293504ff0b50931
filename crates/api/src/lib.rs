//! # api — HTTP Surface for the Attestation Decision Stack
//!
//! Assembles the Decision Engine, Attestor, and Parameter Store into a
//! single Axum application (spec §6), plus the `/healthz` and
//! `/metrics` operational routes. The Anchor Worker (spec §4.G) runs as
//! a separate Tokio task spawned from `main.rs`, not as part of this
//! router.
//!
//! ## API Surface
//!
//! | Route                | Module             | Notes                    |
//! |-----------------------|--------------------|---------------------------|
//! | `POST /decide`        | [`routes::decide`] | the single hot path       |
//! | `GET /healthz`        | [`routes::health`] | liveness only             |
//! | `GET /keys`           | [`routes::attestor`] | public key listing      |
//! | `GET /pubkey`         | [`routes::attestor`] | active public key       |
//! | `POST /sign`          | [`routes::attestor`] | detached signature      |
//! | `POST /verify`        | [`routes::attestor`] | detached verify         |
//! | `POST /sign_jws`      | [`routes::attestor`] | certificate issuance    |
//! | `POST /verify_jws`    | [`routes::attestor`] | certificate verify      |
//! | `GET /param/hash`     | [`routes::params`]  | public                   |
//! | `GET /params`         | [`routes::params`]  | public snapshot          |
//! | `POST /param/threshold` | [`routes::params`] | admin bearer-gated     |
//! | `POST /param/allowlist` | [`routes::params`] | admin bearer-gated     |
//! | `GET /metrics`        | [`metrics`]         | Prometheus exposition   |
//!
//! Grounded on `msez-api`'s `lib.rs::app()` router-assembly pattern
//! (health routes mounted unauthenticated, a single `TraceLayer` wrapping
//! the whole router) — simplified to this stack's single admin-token
//! gate rather than the teacher's role-based `auth_middleware`, since
//! spec §4.C names no roles beyond "admin".

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/decide", post(routes::decide::decide))
        .route("/healthz", get(routes::health::healthz))
        .route("/keys", get(routes::attestor::list_keys))
        .route("/pubkey", get(routes::attestor::pubkey))
        .route("/sign", post(routes::attestor::sign))
        .route("/verify", post(routes::attestor::verify))
        .route("/sign_jws", post(routes::attestor::sign_jws))
        .route("/verify_jws", post(routes::attestor::verify_jws))
        .route("/param/hash", get(routes::params::param_hash))
        .route("/params", get(routes::params::params_snapshot))
        .route("/param/threshold", post(routes::params::set_threshold))
        .route("/param/allowlist", post(routes::params::set_allowlist))
        .route("/metrics", get(metrics::render))
        .layer(from_fn(metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor::Attestor;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use decision_engine::DecisionEngine;
    use http_body_util::BodyExt;
    use ledger::{InMemoryAnchorStore, InMemoryLedger};
    use oracle_client::MockOracle;
    use param_store::InMemoryParamStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let attestor = Arc::new(Attestor::from_env_str("ed25519:k1:seed-one").unwrap());
        let params = Arc::new(InMemoryParamStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let anchors = Arc::new(InMemoryAnchorStore::new());
        let oracle = MockOracle::fixed(true);
        let engine = DecisionEngine::new(params.clone(), oracle, ledger.clone(), attestor.clone());
        AppState::new(engine, attestor, params, ledger, anchors, None)
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let router = app(test_state());
        let req = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn decide_round_trips_through_router() {
        let router = app(test_state());
        let body = serde_json::json!({
            "amount": "10.00",
            "country": "US",
            "ts": "2026-07-27T12:00:00Z",
            "recent": 0
        });
        let req = Request::builder()
            .method("POST")
            .uri("/decide")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["decision"], "PASS");
        assert!(json["certificate_jws"].is_string());
    }

    #[tokio::test]
    async fn param_threshold_rejects_missing_bearer_token() {
        let mut state = test_state();
        state.admin_token = Some(crate::auth::SecretToken::new("s3cr3t"));
        let router = app(state);

        let body = serde_json::json!({"k": "amount_max", "v": "3000.00"});
        let req = Request::builder()
            .method("POST")
            .uri("/param/threshold")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn param_threshold_accepts_valid_bearer_token() {
        let mut state = test_state();
        state.admin_token = Some(crate::auth::SecretToken::new("s3cr3t"));
        let router = app(state);

        let body = serde_json::json!({"k": "amount_max", "v": "3000.00"});
        let req = Request::builder()
            .method("POST")
            .uri("/param/threshold")
            .header("content-type", "application/json")
            .header("authorization", "Bearer s3cr3t")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
