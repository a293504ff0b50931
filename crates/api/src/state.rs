//! # Shared Application State
//!
//! Grounded on `msez-api`'s `state.rs`/`AppState` pattern: a small,
//! cheaply-`Clone`able bundle of `Arc`s handed to every handler via
//! Axum's `State` extractor, built once in `main.rs` from an
//! [`AppConfig`](crate::config::AppConfig).

use std::sync::Arc;

use attestor::Attestor;
use decision_engine::DecisionEngine;
use ledger::{AnchorStore, Ledger};
use param_store::ParamStore;

use crate::auth::SecretToken;

#[derive(Clone)]
pub struct AppState {
    pub engine: DecisionEngine,
    pub attestor: Arc<Attestor>,
    pub params: Arc<dyn ParamStore>,
    pub ledger: Arc<dyn Ledger>,
    pub anchors: Arc<dyn AnchorStore>,
    pub admin_token: Option<SecretToken>,
}

impl AppState {
    pub fn new(
        engine: DecisionEngine,
        attestor: Arc<Attestor>,
        params: Arc<dyn ParamStore>,
        ledger: Arc<dyn Ledger>,
        anchors: Arc<dyn AnchorStore>,
        admin_token: Option<SecretToken>,
    ) -> Self {
        Self {
            engine,
            attestor,
            params,
            ledger,
            anchors,
            admin_token,
        }
    }
}
