//! # cmattest — CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Grounded on `msez-cli`'s `main.rs` (clap derive `Cli`/`Subcommand`
//! structure, `tracing_subscriber` init from a verbosity count).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::anchor_worker::{self, AnchorWorkerArgs};
use cli::keys::{self, KeygenArgs, KeysArgs};
use cli::replay::{self, ReplayArgs};
use cli::verify_cert::{self, VerifyCertArgs};

/// cmattest — operator tooling for the Attestation Decision Stack.
#[derive(Parser, Debug)]
#[command(name = "cmattest", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a fresh random Ed25519 keypair.
    Keygen(KeygenArgs),

    /// List the public keys in an ATTESTOR_KEYS configuration.
    Keys(KeysArgs),

    /// Verify a decision certificate offline, using only published public keys.
    VerifyCert(VerifyCertArgs),

    /// Replay committed decisions against current parameters and report drift.
    Replay(ReplayArgs),

    /// Run the anchor worker standalone, against Postgres.
    AnchorWorker(AnchorWorkerArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let result = match &cli.command {
        Commands::Keygen(args) => keys::run_keygen(args),
        Commands::Keys(args) => keys::run_keys(args),
        Commands::VerifyCert(args) => verify_cert::run(args),
        Commands::Replay(args) => run_async(replay::run(args)),
        Commands::AnchorWorker(args) => run_async(anchor_worker::run(args)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Bridge a Tokio future into `main`'s synchronous clap-dispatch loop,
/// building a fresh current-thread runtime per invocation — these
/// subcommands are one-shot CLI calls, not long-running servers (except
/// `anchor-worker`, which legitimately blocks forever on this runtime).
fn run_async<F: std::future::Future<Output = anyhow::Result<()>>>(fut: F) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to start tokio runtime")
        .block_on(fut)
}
