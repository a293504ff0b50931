//! # HTTP Error Mapping
//!
//! Maps internal error types onto HTTP status codes and a stable JSON
//! error body, following `msez-api`'s `error.rs` `IntoResponse` pattern.
//! Every branch logs at an appropriate level before responding so
//! operators get a trace even when the caller only sees `{"error":
//! "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use attestor::keyring::KeyringError;
use decision_core::CryptoError;
use decision_engine::EngineError;
use ledger::LedgerError;
use param_store::ParamStoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("attestor unreachable: {0}")]
    BadGateway(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
            AppError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                tracing::warn!(error = %self, "upstream unavailable")
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(m) => AppError::BadRequest(m),
            EngineError::ParamStoreUnavailable(m) => AppError::Unavailable(m),
            EngineError::AttestorUnavailable(m) => AppError::BadGateway(m),
            EngineError::Kernel(m) => AppError::Internal(m),
            EngineError::LedgerCommitFailed(m) => AppError::Internal(m),
            EngineError::Internal(m) => AppError::Internal(m),
        }
    }
}

impl From<ParamStoreError> for AppError {
    fn from(e: ParamStoreError) -> Self {
        match e {
            ParamStoreError::Unavailable(m) => AppError::Unavailable(m),
            ParamStoreError::InvalidMutation(m) => AppError::BadRequest(m),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::IdempotencyConflict(m) => AppError::BadRequest(m),
            LedgerError::Unavailable(m) => AppError::Unavailable(m),
            LedgerError::NotFound(m) => AppError::NotFound(m),
        }
    }
}

impl From<CryptoError> for AppError {
    fn from(e: CryptoError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<KeyringError> for AppError {
    fn from(e: KeyringError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}
