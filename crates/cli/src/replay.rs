//! # Replay / Drift Detection
//!
//! `cmattest replay --from <id> --to <id>`. Grounded on
//! `tools/replay.py`: walk ledger rows in order, re-evaluate each one's
//! inputs against the *current* parameter snapshot, and report any row
//! whose decision would come out differently today. Never mutates the
//! ledger — replay is an audit tool, not a repair tool (spec's resolved
//! Open Question: drift is reported, not quarantined).

use anyhow::{Context, Result};
use decision_engine::Bundle;
use ledger::{Ledger, PostgresLedger};
use param_store::{ParamStore, PostgresParamStore};
use policy_kernel::{decide as kernel_decide, Request as KernelRequest};

use clap::Args;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Lowest ledger `id` (inclusive) to replay.
    #[arg(long)]
    pub from: i64,

    /// Highest ledger `id` (inclusive) to replay. Defaults to the
    /// ledger's current maximum.
    #[arg(long)]
    pub to: Option<i64>,

    /// Postgres connection string. Defaults to `DATABASE_URL`.
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run(args: &ReplayArgs) -> Result<()> {
    let url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("no --database-url given and DATABASE_URL is not set")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&url)
        .await
        .context("connecting to Postgres")?;

    let ledger = PostgresLedger::new(pool.clone());
    let params_store = PostgresParamStore::new(pool);

    let to = match args.to {
        Some(to) => to,
        None => ledger.max_id().await.context("reading ledger max id")?,
    };

    let rows = ledger
        .read_range(args.from, to)
        .await
        .context("reading ledger range")?;
    let params = params_store.snapshot().await.context("reading current parameter snapshot")?;

    let mut drift = 0usize;
    for row in &rows {
        let bundle: Bundle = match serde_json::from_str(&row.bundle_json) {
            Ok(b) => b,
            Err(e) => {
                println!("[UNREADABLE] id={} error={e}", row.id);
                continue;
            }
        };

        let ts = match decision_core::Timestamp::parse(&bundle.ts) {
            Ok(ts) => ts,
            Err(e) => {
                println!("[UNREADABLE] id={} bad timestamp {:?}: {e}", row.id, bundle.ts);
                continue;
            }
        };

        let request = KernelRequest {
            amount: bundle.inputs.amount.clone(),
            country: bundle.inputs.country.clone(),
            ts,
            recent: bundle.inputs.recent,
        };
        let now = kernel_decide(&request, &params);

        if now.decision.to_string() != bundle.decision {
            drift += 1;
            println!(
                "[DRIFT] id={} recorded={} now={}",
                row.id,
                bundle.decision,
                now.decision
            );
        }
    }

    println!("Checked {} decisions, drift={drift}", rows.len());
    Ok(())
}
