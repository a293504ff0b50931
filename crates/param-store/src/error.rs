//! Errors surfaced by parameter store backends.

use thiserror::Error;

/// Error reading or mutating a parameter snapshot.
#[derive(Debug, Error)]
pub enum ParamStoreError {
    /// The backing store (e.g. Postgres) could not be reached or returned
    /// an unexpected error. Fatal to the current request — spec §7:
    /// "Parameter-store unreachability is fatal (no kernel evaluation
    /// without a consistent snapshot)."
    #[error("parameter store unavailable: {0}")]
    Unavailable(String),

    /// A mutation referenced a malformed threshold key or country code.
    #[error("invalid parameter mutation: {0}")]
    InvalidMutation(String),
}
