//! Errors surfaced by ledger backends.

use thiserror::Error;

/// Error appending to or reading from the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A row with this `idempotency_key` already exists; the caller
    /// should read it back and return the committed row rather than
    /// retry the write (spec §4.F, §9 "Idempotency race").
    #[error("idempotency key {0:?} already committed")]
    IdempotencyConflict(String),

    /// The backing store could not be reached or returned an unexpected
    /// error.
    #[error("ledger storage unavailable: {0}")]
    Unavailable(String),

    /// A read referenced a row or range that does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}
