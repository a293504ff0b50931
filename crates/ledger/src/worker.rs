//! # Anchor Worker
//!
//! Spec §4.G: a long-running periodic task. Each cycle reads the next
//! contiguous, unanchored range of ledger rows, computes the string-hex
//! Merkle root (see [`crate::merkle`]) over their `proof_id`s, has the
//! attestor sign the anchor bundle, and inserts an immutable anchor row.

use crate::merkle::merkle_root;
use crate::store::{AnchorStore, Ledger, NewAnchorRow};
use attestor::Attestor;
use decision_core::CanonicalBytes;
use std::sync::Arc;
use std::time::Duration;

/// How many ledger rows a single anchor cycle covers at most.
pub const MAX_ROWS_PER_ANCHOR: i64 = 1000;

/// How long the worker sleeps between cycles when there is nothing new
/// to anchor, or after a successful cycle.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(10);

/// How long the worker backs off after an error before retrying.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// The anchor bundle shape signed by the attestor (spec §4.G step 4).
#[derive(serde::Serialize)]
struct AnchorBundle {
    #[serde(rename = "type")]
    kind: &'static str,
    from_id: i64,
    to_id: i64,
    merkle_root: String,
}

/// Run one anchor cycle: find the next range, anchor it if non-empty.
/// Returns `Ok(true)` if a new anchor was written, `Ok(false)` if there
/// was nothing to anchor.
pub async fn run_cycle(
    ledger: &dyn Ledger,
    anchors: &dyn AnchorStore,
    attestor: &Attestor,
) -> Result<bool, ledger_error::AnchorCycleError> {
    let max_anchored = anchors.max_to_id().await?;
    let start = max_anchored + 1;

    let rows = ledger.read_from(start, MAX_ROWS_PER_ANCHOR).await?;
    if rows.is_empty() {
        return Ok(false);
    }

    let from_id = rows.first().expect("non-empty").id;
    let to_id = rows.last().expect("non-empty").id;
    let proof_ids: Vec<String> = rows.iter().map(|r| r.proof_id.clone()).collect();
    let root = merkle_root(&proof_ids).expect("non-empty leaf set always yields a root");

    let bundle = AnchorBundle {
        kind: "anchor",
        from_id,
        to_id,
        merkle_root: root.clone(),
    };
    let canonical = CanonicalBytes::new(&bundle)?;
    let signed = attestor.sign_bundle(&canonical);

    anchors
        .append(NewAnchorRow {
            from_id,
            to_id,
            merkle_root: root,
            kid: signed.kid,
            attestor_signature: signed.signature.to_b64(),
        })
        .await?;

    Ok(true)
}

/// Run the anchor worker loop forever: repeatedly call [`run_cycle`],
/// sleeping `CYCLE_INTERVAL` when idle or after success, and backing off
/// `ERROR_BACKOFF` on error (spec §4.G step 5, "On any error, log and
/// back off.").
pub async fn run_forever(ledger: Arc<dyn Ledger>, anchors: Arc<dyn AnchorStore>, attestor: Arc<Attestor>) -> ! {
    loop {
        match run_cycle(ledger.as_ref(), anchors.as_ref(), attestor.as_ref()).await {
            Ok(true) => {
                tracing::info!("anchor cycle committed a new anchor");
            }
            Ok(false) => {
                tracing::debug!("anchor cycle found nothing new to anchor");
            }
            Err(err) => {
                tracing::error!(error = %err, "anchor cycle failed, backing off");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        }
        tokio::time::sleep(CYCLE_INTERVAL).await;
    }
}

/// Errors surfaced from a single anchor cycle.
pub mod ledger_error {
    use crate::error::LedgerError;
    use decision_core::CanonicalizationError;
    use thiserror::Error;

    /// Error running one anchor cycle.
    #[derive(Debug, Error)]
    pub enum AnchorCycleError {
        /// A ledger or anchor-table read/write failed.
        #[error("ledger storage error: {0}")]
        Storage(#[from] LedgerError),
        /// The anchor bundle could not be canonicalized (should never
        /// happen — the bundle contains no floats).
        #[error("anchor bundle canonicalization failed: {0}")]
        Canonicalization(#[from] CanonicalizationError),
    }
}
