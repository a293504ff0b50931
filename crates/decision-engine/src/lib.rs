//! # decision-engine — Orchestrates a Single `/decide` Call
//!
//! Spec §4.C. Pulls together `policy-kernel` (pure evaluation),
//! `oracle-client` (one-bit resolution), `attestor` (signing), and
//! `ledger` (the transactional commit) into the ten-step procedure the
//! HTTP layer (`api` crate) exposes as `POST /decide`.

pub mod bundle;
pub mod engine;
pub mod error;

pub use bundle::{Bundle, CertificatePayload, Inputs};
pub use engine::{DecideRequest, DecideResponse, DecisionEngine, ATTESTOR_TIMEOUT, ENGINE_TOTAL_TIMEOUT, ORACLE_TIMEOUT};
pub use error::EngineError;
