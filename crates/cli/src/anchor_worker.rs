//! # Standalone Anchor Worker
//!
//! `cmattest anchor-worker`. Runs [`ledger::worker::run_forever`] as a
//! foreground process against Postgres, for deployments that want the
//! worker as its own process/pod rather than a background task inside
//! `cmattest-api`. Grounded on `services/anchor/anchor.py`'s standalone
//! main loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use attestor::Attestor;
use clap::Args;
use ledger::{PostgresAnchorStore, PostgresLedger};

#[derive(Args, Debug)]
pub struct AnchorWorkerArgs {
    /// Postgres connection string. Defaults to `DATABASE_URL`.
    #[arg(long)]
    pub database_url: Option<String>,

    /// `ATTESTOR_KEYS`-grammar string. Defaults to the `ATTESTOR_KEYS`
    /// environment variable.
    #[arg(long)]
    pub attestor_keys: Option<String>,
}

pub async fn run(args: &AnchorWorkerArgs) -> Result<()> {
    let url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("no --database-url given and DATABASE_URL is not set")?;
    let keys = args
        .attestor_keys
        .clone()
        .or_else(|| std::env::var("ATTESTOR_KEYS").ok())
        .context("no --attestor-keys given and ATTESTOR_KEYS is not set")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&url)
        .await
        .context("connecting to Postgres")?;

    let attestor = Arc::new(Attestor::from_env_str(&keys).context("parsing ATTESTOR_KEYS")?);
    let ledger = Arc::new(PostgresLedger::new(pool.clone()));
    let anchors = Arc::new(PostgresAnchorStore::new(pool));

    tracing::info!("standalone anchor worker starting");
    ledger::worker::run_forever(ledger, anchors, attestor).await;
}
