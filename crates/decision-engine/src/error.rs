//! Errors surfaced by the Decision Engine (spec §7).

use thiserror::Error;

/// An error resolving a single `/decide` request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request body failed validation (spec §7, `ValidationError`).
    #[error("validation error: {0}")]
    Validation(String),

    /// The parameter store could not be read; fatal, since no kernel
    /// evaluation may proceed without a consistent snapshot (spec §7).
    #[error("parameter store unavailable: {0}")]
    ParamStoreUnavailable(String),

    /// The kernel itself failed (should not happen — it is pure and
    /// total over valid inputs, but defensively surfaced rather than
    /// silently producing a bad decision).
    #[error("kernel evaluation failed: {0}")]
    Kernel(String),

    /// The attestor could not be reached for either the raw signature or
    /// the JWS certificate. No ledger write is attempted (spec §7,
    /// `AttestorUnavailable`).
    #[error("attestor unavailable: {0}")]
    AttestorUnavailable(String),

    /// The ledger write failed after signing and retries were exhausted;
    /// the signed-but-unstored certificate is discarded (spec §4.C
    /// step 9, §7).
    #[error("ledger commit failed: {0}")]
    LedgerCommitFailed(String),

    /// An unclassified internal failure (spec §7, `InternalError`).
    #[error("internal error: {0}")]
    Internal(String),
}
