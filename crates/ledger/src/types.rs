//! Row types persisted by the ledger and anchor table (spec §3, §6
//! "Persisted state").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed decision: the canonical bundle bytes, its `proof_id`,
/// the certificate, and the idempotency key that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerRow {
    pub id: i64,
    pub kernel_id: String,
    pub param_hash: String,
    /// The JCS-canonicalized bundle, stored verbatim so it can be
    /// re-served or re-verified without re-deriving it.
    pub bundle_json: String,
    pub proof_id: String,
    pub certificate_jws: String,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// One committed anchor: a signed Merkle root over a contiguous,
/// non-overlapping range of ledger rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnchorRow {
    pub id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub merkle_root: String,
    /// Persisted alongside the row (a redesign flag applied — see
    /// SPEC_FULL.md — diverging from the original, which signed the
    /// anchor bundle but never stored the signature).
    pub kid: String,
    pub attestor_signature: String,
    pub created_at: DateTime<Utc>,
}
