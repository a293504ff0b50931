//! # ledger — Append-Only Decision Ledger, Idempotency Cache, and Anchor Worker
//!
//! Spec §4.F, §4.G, §5. Two storage traits ([`Ledger`], [`AnchorStore`])
//! each with in-memory and Postgres implementations, plus the anchor
//! worker loop in [`worker`] and the anchor Merkle algorithm in
//! [`merkle`] — deliberately distinct from any general-purpose
//! domain-separated Merkle tree elsewhere in this workspace (see
//! [`merkle`]'s module docs).

pub mod error;
pub mod merkle;
pub mod store;
pub mod types;
pub mod worker;

pub use error::LedgerError;
pub use merkle::merkle_root;
pub use store::{
    AnchorStore, AppendOutcome, InMemoryAnchorStore, InMemoryLedger, Ledger, NewAnchorRow, NewLedgerRow,
    PostgresAnchorStore, PostgresLedger,
};
pub use types::{AnchorRow, LedgerRow};
pub use worker::{run_cycle, run_forever, CYCLE_INTERVAL, ERROR_BACKOFF, MAX_ROWS_PER_ANCHOR};
