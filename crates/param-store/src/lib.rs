//! # param-store — Admin-Mutable Kernel Parameter Snapshots
//!
//! Spec §4.C. Two backends behind one [`store::ParamStore`] trait: an
//! in-memory store for tests and single-process deployments, and a
//! Postgres-backed store for the deployed API, grounded on
//! `services/control/app.py`'s `params_thresholds` / `params_allowlist`
//! schema.

pub mod error;
pub mod store;

pub use error::ParamStoreError;
pub use store::{InMemoryParamStore, ParamStore, PostgresParamStore};
