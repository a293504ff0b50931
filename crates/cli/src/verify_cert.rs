//! # Offline Certificate Verification
//!
//! `cmattest verify-cert <jws-file> --keys-url <url-or-file>`. Grounded
//! on `tools/verify_cert.py`: fetch the public keys once (here, either
//! over HTTP from a running `api` instance's `/keys` route, or from a
//! local JSON file with the same shape, for fully offline use), then
//! verify the certificate using only those public keys — no signing
//! capability, no attestor process required.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use attestor::jws::{verify_with_public_keys, CompactJws};
use attestor::keys::VerifyingKey;
use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct VerifyCertArgs {
    /// Path to a file containing the compact JWS string to verify.
    pub jws_file: PathBuf,

    /// Where to fetch public keys from: an `http(s)://` URL (the `api`
    /// crate's `/keys` route) or a local path to a JSON file with the
    /// same `{"active": ..., "keys": {"kid": "base64 verify key", ...}}`
    /// shape.
    #[arg(long)]
    pub keys_url: String,
}

#[derive(Deserialize)]
struct KeysResponse {
    #[allow(dead_code)]
    active: String,
    keys: BTreeMap<String, VerifyingKey>,
}

pub fn run(args: &VerifyCertArgs) -> Result<()> {
    let jws_str = std::fs::read_to_string(&args.jws_file)
        .with_context(|| format!("reading {}", args.jws_file.display()))?
        .trim()
        .to_string();
    let jws = CompactJws::parse(&jws_str).context("malformed JWS")?;

    let keys_json = fetch_keys_json(&args.keys_url)?;
    let parsed: KeysResponse = serde_json::from_str(&keys_json).context("parsing keys response")?;
    let keys: BTreeMap<String, VerifyingKey> = parsed.keys;

    match verify_with_public_keys(&keys, &jws) {
        Ok(payload_bytes) => {
            let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
                .context("certificate payload was valid but not JSON")?;
            println!("VALID {payload}");
            Ok(())
        }
        Err(e) => bail!("INVALID: {e}"),
    }
}

fn fetch_keys_json(keys_url: &str) -> Result<String> {
    if keys_url.starts_with("http://") || keys_url.starts_with("https://") {
        let response = reqwest::blocking::get(keys_url)
            .with_context(|| format!("fetching keys from {keys_url}"))?;
        response.text().context("reading keys response body")
    } else {
        std::fs::read_to_string(keys_url).with_context(|| format!("reading {keys_url}"))
    }
}
