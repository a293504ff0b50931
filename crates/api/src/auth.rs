//! # Admin Bearer-Token Gate
//!
//! Spec §4.C requires mutating parameter-store operations to sit behind
//! a bearer token. The original control service did a direct string
//! comparison (`auth != f"Bearer {ADMIN_TOKEN}"`); we tighten that to a
//! constant-time comparison, following the pattern in
//! `msez-api`'s `auth.rs` (bearer token checked via
//! `subtle::ConstantTimeEq` rather than `==`, so token length/contents
//! can't leak through response timing).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// A bearer token held only as bytes; never implements `Display`/`Debug`
/// with its contents so it can't end up in a log line by accident.
#[derive(Clone)]
pub struct SecretToken(Vec<u8>);

impl SecretToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().into_bytes())
    }

    fn matches(&self, candidate: &[u8]) -> bool {
        self.0.len() == candidate.len() && bool::from(self.0.as_slice().ct_eq(candidate))
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(..)")
    }
}

/// Extractor proving the request carried a valid `Authorization: Bearer
/// <token>` header matching the configured admin token. Route handlers
/// that need the admin gate simply add this as an argument; Axum runs
/// the check before the handler body executes.
pub struct AdminIdentity;

impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_ref() else {
            return Err(AppError::Unauthorized(
                "admin token not configured".to_string(),
            ));
        };

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let candidate = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed Authorization header".to_string()))?;

        if expected.matches(candidate.as_bytes()) {
            Ok(AdminIdentity)
        } else {
            Err(AppError::Unauthorized("invalid admin token".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_is_constant_time_and_correct() {
        let token = SecretToken::new("s3cr3t");
        assert!(token.matches(b"s3cr3t"));
        assert!(!token.matches(b"s3cr3x"));
        assert!(!token.matches(b"short"));
        assert!(!token.matches(b"s3cr3t-but-longer"));
    }
}
