//! # api — Binary Entry Point
//!
//! Starts the Axum HTTP server and the Anchor Worker background task.
//! Grounded on `msez-api`'s `main.rs` bootstrap sequence (tracing init,
//! config from env, pool init, `app()`, `axum::serve`), adapted for this
//! stack's single-service topology — no proxy clients, no zone
//! bootstrap file, one optional Postgres pool shared by every storage
//! backend.

use std::sync::Arc;

use attestor::Attestor;
use decision_engine::DecisionEngine;
use ledger::{AnchorStore, InMemoryAnchorStore, InMemoryLedger, Ledger, PostgresAnchorStore, PostgresLedger};
use oracle_client::{HttpOracle, MockOracle, OneBitOracle};
use param_store::{InMemoryParamStore, ParamStore, PostgresParamStore};

use api::config::AppConfig;
use api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let prometheus_handle = api::metrics::install_recorder();
    api::metrics::set_handle(prometheus_handle);

    let config = AppConfig::from_env();

    let attestor = Arc::new(
        Attestor::from_env_str(&config.attestor_keys).map_err(|e| {
            tracing::error!("failed to parse ATTESTOR_KEYS: {e}");
            e
        })?,
    );
    if let Some(kid) = &config.attestor_active_kid {
        tracing::info!(kid = %kid, "ATTESTOR_ACTIVE_KID set but rotation is an admin operation; ignoring at boot");
    }

    let (params, ledger, anchors): (Arc<dyn ParamStore>, Arc<dyn Ledger>, Arc<dyn AnchorStore>) =
        match &config.database_url {
            Some(url) => {
                tracing::info!("connecting to Postgres");
                let pool = sqlx::postgres::PgPoolOptions::new().connect(url).await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                (
                    Arc::new(PostgresParamStore::new(pool.clone())),
                    Arc::new(PostgresLedger::new(pool.clone())),
                    Arc::new(PostgresAnchorStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; running with in-memory storage (non-durable)");
                (
                    Arc::new(InMemoryParamStore::new()),
                    Arc::new(InMemoryLedger::new()),
                    Arc::new(InMemoryAnchorStore::new()),
                )
            }
        };

    let oracle: Arc<dyn OneBitOracle> = match &config.worldcheck_url {
        Some(url) => Arc::new(HttpOracle::new(url.clone()).with_tls_verify(config.oracle_tls_verify)),
        None => {
            tracing::warn!("WORLDCHECK_URL not set; using a fixed-pass mock oracle");
            MockOracle::fixed(true)
        }
    };

    let engine = DecisionEngine::new(params.clone(), oracle, ledger.clone(), attestor.clone());

    tokio::spawn(ledger::worker::run_forever(
        ledger.clone(),
        anchors.clone(),
        attestor.clone(),
    ));

    let state = AppState::new(engine, attestor, params, ledger, anchors, config.admin_token.clone());
    let app = api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("cmattest-api listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
