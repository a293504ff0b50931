//! # Keyring Inspection and Generation
//!
//! `cmattest keygen` mints a fresh random Ed25519 seed and prints it in
//! the `alg:kid:seed` grammar `ATTESTOR_KEYS` expects, plus the
//! resulting public key, so an operator can add it to the environment
//! before rotating. `cmattest keys` parses an existing `ATTESTOR_KEYS`
//! value (from `--keys` or the environment) and lists every configured
//! key without needing a running attestor service.

use anyhow::{Context, Result};
use attestor::keyring::Keyring;
use attestor::keys::KeyEntry;
use clap::Args;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// The `kid` to mint the new key under.
    #[arg(long)]
    pub kid: String,
}

pub fn run_keygen(args: &KeygenArgs) -> Result<()> {
    let entry = KeyEntry::generate();
    let public_key = entry.verifying_key();

    // A freshly generated key has no recoverable seed string to print —
    // `ATTESTOR_KEYS` derives keys from a seed via SHA-256, and
    // `KeyEntry::generate` bypasses that derivation entirely for true
    // randomness. Operators who need a reproducible seed should instead
    // pick their own seed string and pass it through `ed25519:<kid>:<seed>`
    // directly; this command is for the common one-off case.
    println!("kid: {}", args.kid);
    println!("alg: {}", attestor::keyring::ALG_ED25519);
    println!("public_key: {}", public_key.to_b64());
    println!(
        "note: this key has no recoverable seed; to make it reproducible across restarts, \
         choose your own seed string and configure ATTESTOR_KEYS=ed25519:{}:<your-seed> instead",
        args.kid
    );

    Ok(())
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Raw `ATTESTOR_KEYS` value. Defaults to the `ATTESTOR_KEYS`
    /// environment variable.
    #[arg(long)]
    pub keys: Option<String>,
}

pub fn run_keys(args: &KeysArgs) -> Result<()> {
    let raw = args
        .keys
        .clone()
        .or_else(|| std::env::var("ATTESTOR_KEYS").ok())
        .context("no --keys given and ATTESTOR_KEYS is not set")?;

    let keyring = Keyring::from_env_str(&raw).context("failed to parse ATTESTOR_KEYS")?;

    println!("active_kid: {}", keyring.active_kid());
    for (kid, key) in keyring.list_public_keys() {
        println!("{kid}: {}", key.to_b64());
    }

    Ok(())
}
