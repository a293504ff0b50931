//! # The Decision Engine
//!
//! Orchestrates spec §4.C's ten-step procedure. Grounded on
//! `services/decider/app.py`, with one structural change: where the
//! Python service reaches the attestor over HTTP for both the raw
//! signature and the JWS certificate, this engine holds an in-process
//! `Arc<Attestor>` and calls it directly — the attestor's "two round
//! trips" are still two distinct signing operations (raw, then JWS), but
//! the attestor's own `/sign` and `/sign_jws` HTTP routes (in the `api`
//! crate) share this exact code path for callers outside the engine.

use crate::bundle::{Bundle, CertificatePayload, Inputs};
use crate::error::EngineError;
use attestor::Attestor;
use decision_core::{sha256_hex, sha256_raw_hex, Amount, CanonicalBytes, CountryCode, Timestamp};
use ledger::{AppendOutcome, Ledger, NewLedgerRow};
use oracle_client::{OneBitOracle, OracleError};
use param_store::ParamStore;
use policy_kernel::{decide as kernel_decide, Decision, Request as KernelRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The attestor signing budget (spec §5).
pub const ATTESTOR_TIMEOUT: Duration = Duration::from_secs(5);
/// The one-bit oracle budget (spec §5) — soft; a timeout resolves to
/// `HOLD_HUMAN` rather than failing the request.
pub const ORACLE_TIMEOUT: Duration = Duration::from_secs(5);
/// The whole-request budget (spec §5).
pub const ENGINE_TOTAL_TIMEOUT: Duration = Duration::from_secs(7);

/// A `/decide` request body (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideRequest {
    pub amount: Amount,
    pub country: CountryCode,
    pub ts: Timestamp,
    #[serde(default)]
    pub recent: u32,
    pub context_id: Option<String>,
}

/// A `/decide` response body (spec §6). `anchor` is always `null` at
/// response time — anchoring happens asynchronously, later, over a range
/// that includes this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideResponse {
    pub decision: Decision,
    pub obligations: Vec<String>,
    pub kernel_id: String,
    pub param_hash: String,
    pub kid: String,
    pub signature_b64: String,
    pub proof_id: String,
    pub anchor: Option<serde_json::Value>,
    pub certificate_jws: String,
}

/// The Decision Engine: holds references to every collaborator a
/// `/decide` call needs. Cheap to clone (every field is an `Arc`).
#[derive(Clone)]
pub struct DecisionEngine {
    params: Arc<dyn ParamStore>,
    oracle: Arc<dyn OneBitOracle>,
    ledger: Arc<dyn Ledger>,
    attestor: Arc<Attestor>,
}

impl DecisionEngine {
    pub fn new(
        params: Arc<dyn ParamStore>,
        oracle: Arc<dyn OneBitOracle>,
        ledger: Arc<dyn Ledger>,
        attestor: Arc<Attestor>,
    ) -> Self {
        Self {
            params,
            oracle,
            ledger,
            attestor,
        }
    }

    /// Resolve one `/decide` request end to end (spec §4.C steps 1-10),
    /// bounded by [`ENGINE_TOTAL_TIMEOUT`].
    pub async fn decide(
        &self,
        request: &DecideRequest,
        idempotency_key: Option<&str>,
    ) -> Result<DecideResponse, EngineError> {
        match tokio::time::timeout(ENGINE_TOTAL_TIMEOUT, self.decide_inner(request, idempotency_key)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Internal("decision exceeded the engine timeout budget".into())),
        }
    }

    async fn decide_inner(
        &self,
        request: &DecideRequest,
        idempotency_key: Option<&str>,
    ) -> Result<DecideResponse, EngineError> {
        let idem_key = idempotency_key
            .map(str::to_string)
            .unwrap_or_else(|| derive_auto_idempotency_key(request));

        // Step 1: idempotency short-circuit.
        if let Some(cached) = self
            .ledger
            .cached_response(&idem_key)
            .await
            .map_err(|e| EngineError::LedgerCommitFailed(e.to_string()))?
        {
            return serde_json::from_str(&cached)
                .map_err(|e| EngineError::Internal(format!("corrupt cached response: {e}")));
        }

        // Step 2/3: read parameter snapshot, evaluate kernel.
        let params = self
            .params
            .snapshot()
            .await
            .map_err(|e| EngineError::ParamStoreUnavailable(e.to_string()))?;

        let kernel_request = KernelRequest {
            amount: request.amount,
            country: request.country.clone(),
            ts: request.ts.clone(),
            recent: request.recent,
        };
        let kernel_out = kernel_decide(&kernel_request, &params);
        let mut decision = kernel_out.decision;
        let mut obligations = kernel_out.obligations;

        // Step 4: resolve NEED_ONE_BIT via the oracle.
        if decision == Decision::NeedOneBit {
            match self.oracle.verify(request.context_id.as_deref(), ORACLE_TIMEOUT).await {
                Ok(true) => decision = Decision::Pass,
                Ok(false) => decision = Decision::HoldHuman,
                Err(OracleError::Timeout) | Err(OracleError::Unreachable(_)) => {
                    decision = Decision::HoldHuman;
                    obligations.push("oracle_unreachable".to_string());
                }
            }
            obligations.push(policy_kernel::OBLIGATION_WORLDCHECK_QUERIED.to_string());
        }

        debug_assert_ne!(
            decision,
            Decision::NeedOneBit,
            "NEED_ONE_BIT must never survive to the signed bundle (spec §9)"
        );

        // Step 5: build the canonical bundle.
        let ts = Timestamp::now().to_iso8601();
        let bundle = Bundle {
            ts: ts.clone(),
            decision: decision.to_string(),
            obligations: obligations.clone(),
            kernel_id: kernel_out.kernel_id.clone(),
            param_hash: kernel_out.param_hash.clone(),
            inputs: Inputs {
                amount: request.amount,
                country: request.country.clone(),
                recent: request.recent,
            },
        };
        let canonical_bundle =
            CanonicalBytes::new(&bundle).map_err(|e| EngineError::Internal(format!("bundle canonicalization failed: {e}")))?;

        // Step 6: raw signature from the attestor.
        let bundle_signature = tokio::time::timeout(ATTESTOR_TIMEOUT, async {
            Ok::<_, EngineError>(self.attestor.sign_bundle(&canonical_bundle))
        })
        .await
        .map_err(|_| EngineError::AttestorUnavailable("attestor sign timed out".into()))??;

        // Step 7: proof_id = SHA-256(canonical_bundle_bytes || "|" || signature_b64), hex.
        let signature_b64 = bundle_signature.signature.to_b64();
        let proof_id = compute_proof_id(&canonical_bundle, &signature_b64);

        // Step 8: JWS certificate, whose kid MUST match the raw signature's kid.
        let certificate_payload = CertificatePayload {
            sub: "decision".to_string(),
            ts,
            decision: decision.to_string(),
            kernel_id: kernel_out.kernel_id.clone(),
            param_hash: kernel_out.param_hash.clone(),
            inputs: Inputs {
                amount: request.amount,
                country: request.country.clone(),
                recent: request.recent,
            },
            obligations: obligations.clone(),
            proof_id: proof_id.clone(),
        };
        let canonical_cert_payload = CanonicalBytes::new(&certificate_payload)
            .map_err(|e| EngineError::Internal(format!("certificate payload canonicalization failed: {e}")))?;

        let jws = tokio::time::timeout(ATTESTOR_TIMEOUT, async {
            self.attestor
                .sign_certificate(&canonical_cert_payload)
                .map_err(|e| EngineError::AttestorUnavailable(e.to_string()))
        })
        .await
        .map_err(|_| EngineError::AttestorUnavailable("attestor sign_jws timed out".into()))??;

        debug_assert_eq!(
            jws.peek_kid().unwrap_or_default(),
            bundle_signature.kid,
            "JWS kid must equal the raw signature's kid (spec §4.C step 8)"
        );

        let response = DecideResponse {
            decision,
            obligations,
            kernel_id: kernel_out.kernel_id,
            param_hash: kernel_out.param_hash,
            kid: bundle_signature.kid.clone(),
            signature_b64,
            proof_id: proof_id.clone(),
            anchor: None,
            certificate_jws: jws.to_compact_string(),
        };
        let response_json =
            serde_json::to_string(&response).map_err(|e| EngineError::Internal(format!("response serialization failed: {e}")))?;

        // Step 9: commit ledger + idempotency cache transactionally.
        let new_row = NewLedgerRow {
            kernel_id: response.kernel_id.clone(),
            param_hash: response.param_hash.clone(),
            bundle_json: String::from_utf8(canonical_bundle.as_bytes().to_vec())
                .map_err(|e| EngineError::Internal(format!("bundle bytes not utf8: {e}")))?,
            proof_id: proof_id.clone(),
            certificate_jws: response.certificate_jws.clone(),
            idempotency_key: idem_key,
        };

        match self.ledger.append(new_row, response_json).await {
            Ok(AppendOutcome::Committed(_)) => Ok(response),
            Ok(AppendOutcome::AlreadyExists { cached_response_json }) => serde_json::from_str(&cached_response_json)
                .map_err(|e| EngineError::Internal(format!("corrupt raced-in response: {e}"))),
            Err(e) => Err(EngineError::LedgerCommitFailed(e.to_string())),
        }
    }
}

/// Derive the fallback idempotency key used when the caller sends no
/// `Idempotency-Key` header: `"auto:" + SHA-256(canonical request JSON)`,
/// matching `services/decider/app.py`'s behavior.
fn derive_auto_idempotency_key(request: &DecideRequest) -> String {
    let canonical = CanonicalBytes::new(request).expect("DecideRequest contains no floats");
    format!("auto:{}", sha256_hex(&canonical))
}

/// `proof_id = SHA-256(canonical_bundle_bytes || "|" || signature_b64)`,
/// hex (spec §3).
fn compute_proof_id(canonical_bundle: &CanonicalBytes, signature_b64: &str) -> String {
    let mut raw = canonical_bundle.as_bytes().to_vec();
    raw.push(b'|');
    raw.extend_from_slice(signature_b64.as_bytes());
    sha256_raw_hex(&raw)
}
