//! # oracle-client — the One-Bit Oracle
//!
//! Spec §4.D / GLOSSARY: "external boolean check consulted when policy
//! cannot decide unaided." The Decision Engine calls this only when the
//! kernel returns `NEED_ONE_BIT`; the result resolves to `PASS` or
//! `HOLD_HUMAN` (spec §4.C step 4).
//!
//! Grounded on `services/worldcheck/app.py`'s `/verify` contract:
//! `{type, tx_id?, force?}` → `{bit, latency_ms}`. `force` lets callers
//! (and this crate's [`MockOracle`]) override the vendor's randomness
//! deterministically — essential for reproducing spec §8 scenario 3.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error resolving a one-bit oracle query. The Decision Engine maps every
/// variant to `HOLD_HUMAN` with an `"oracle_unreachable"` obligation
/// (spec §4.C step 4, §7) — it never propagates this as an HTTP error.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle did not respond within the caller's timeout budget.
    #[error("oracle call timed out")]
    Timeout,
    /// The oracle returned a network or protocol-level failure.
    #[error("oracle unreachable: {0}")]
    Unreachable(String),
}

/// A one-bit decision oracle.
#[async_trait]
pub trait OneBitOracle: Send + Sync {
    /// Resolve a single boolean verification, within the given timeout.
    async fn verify(&self, tx_id: Option<&str>, timeout: Duration) -> Result<bool, OracleError>;
}

/// An HTTP client for a deployed WorldCheck-style vendor.
pub struct HttpOracle {
    base_url: String,
    client: reqwest::Client,
}

#[derive(serde::Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    tx_id: Option<&'a str>,
}

#[derive(serde::Deserialize)]
struct VerifyResponse {
    bit: bool,
    #[allow(dead_code)]
    latency_ms: i64,
}

impl HttpOracle {
    /// Build a client against the given base URL (e.g. `WORLDCHECK_URL`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Rebuild the inner HTTP client with TLS verification on (the
    /// default) or off. Only ever disabled for local development
    /// against a self-signed stand-in for the vendor oracle.
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify)
            .build()
            .expect("reqwest client configuration is always valid");
        self
    }
}

#[async_trait]
impl OneBitOracle for HttpOracle {
    async fn verify(&self, tx_id: Option<&str>, timeout: Duration) -> Result<bool, OracleError> {
        let url = format!("{}/verify", self.base_url.trim_end_matches('/'));
        let body = VerifyRequest {
            kind: "issuer_verify",
            tx_id,
        };

        let response = tokio::time::timeout(timeout, self.client.post(&url).json(&body).send())
            .await
            .map_err(|_| OracleError::Timeout)?
            .map_err(|e| OracleError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Unreachable(format!(
                "oracle returned status {}",
                response.status()
            )));
        }

        let parsed: VerifyResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Unreachable(e.to_string()))?;
        Ok(parsed.bit)
    }
}

/// A deterministic test double, grounded on `services/worldcheck/app.py`'s
/// `force` override. Two modes:
///
/// - [`MockOracle::fixed`]: always returns the configured bit.
/// - [`MockOracle::always_timeout`] / [`MockOracle::always_unreachable`]:
///   always fails, to exercise the engine's `"oracle_unreachable"` path.
pub struct MockOracle {
    forced_bit: Option<bool>,
    fail_mode: Option<OracleFailMode>,
    call_count: AtomicUsize,
    last_tx_id_seen: AtomicBool,
}

enum OracleFailMode {
    Timeout,
    Unreachable,
}

impl MockOracle {
    /// Always resolve with the given bit.
    pub fn fixed(bit: bool) -> Arc<Self> {
        Arc::new(Self {
            forced_bit: Some(bit),
            fail_mode: None,
            call_count: AtomicUsize::new(0),
            last_tx_id_seen: AtomicBool::new(false),
        })
    }

    /// Always time out.
    pub fn always_timeout() -> Arc<Self> {
        Arc::new(Self {
            forced_bit: None,
            fail_mode: Some(OracleFailMode::Timeout),
            call_count: AtomicUsize::new(0),
            last_tx_id_seen: AtomicBool::new(false),
        })
    }

    /// Always fail as unreachable.
    pub fn always_unreachable() -> Arc<Self> {
        Arc::new(Self {
            forced_bit: None,
            fail_mode: Some(OracleFailMode::Unreachable),
            call_count: AtomicUsize::new(0),
            last_tx_id_seen: AtomicBool::new(false),
        })
    }

    /// How many times `verify` has been invoked.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OneBitOracle for MockOracle {
    async fn verify(&self, tx_id: Option<&str>, _timeout: Duration) -> Result<bool, OracleError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.last_tx_id_seen.store(tx_id.is_some(), Ordering::SeqCst);
        if let Some(mode) = &self.fail_mode {
            return match mode {
                OracleFailMode::Timeout => Err(OracleError::Timeout),
                OracleFailMode::Unreachable => Err(OracleError::Unreachable("mock unreachable".into())),
            };
        }
        Ok(self.forced_bit.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_oracle_returns_fixed_bit() {
        let oracle = MockOracle::fixed(true);
        let bit = oracle.verify(Some("tx1"), Duration::from_secs(1)).await.unwrap();
        assert!(bit);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn mock_oracle_always_timeout_surfaces_timeout_error() {
        let oracle = MockOracle::always_timeout();
        let result = oracle.verify(None, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(OracleError::Timeout)));
    }

    #[tokio::test]
    async fn mock_oracle_always_unreachable_surfaces_unreachable_error() {
        let oracle = MockOracle::always_unreachable();
        let result = oracle.verify(None, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(OracleError::Unreachable(_))));
    }

    #[tokio::test]
    async fn mock_oracle_counts_calls() {
        let oracle = MockOracle::fixed(false);
        for _ in 0..3 {
            let _ = oracle.verify(None, Duration::from_secs(1)).await;
        }
        assert_eq!(oracle.call_count(), 3);
    }
}
