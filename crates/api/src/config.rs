//! # Configuration — Environment Variables
//!
//! Spec §6's "Configuration (environment)" section: attestor seeds,
//! active `kid`, database connection, attestor/oracle base URLs, TLS
//! verification flag, admin bearer token, default country. Unknown
//! variables are ignored — this module only ever reads the names it
//! recognizes.

use crate::auth::SecretToken;

/// Runtime configuration assembled once at startup from the process
/// environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PORT` — HTTP listen port. Default `8080`.
    pub port: u16,
    /// `ATTESTOR_KEYS` — `alg:kid:seed` triples joined by `;`.
    pub attestor_keys: String,
    /// `ATTESTOR_ACTIVE_KID` — overrides which parsed key is active, if set.
    pub attestor_active_kid: Option<String>,
    /// `DATABASE_URL` — Postgres connection string. Absent means the
    /// in-memory backends are used (tests, local/dev runs).
    pub database_url: Option<String>,
    /// `WORLDCHECK_URL` — base URL of the one-bit oracle. Absent means
    /// the deterministic [`oracle_client::MockOracle`] is used instead.
    pub worldcheck_url: Option<String>,
    /// `WORLDCHECK_TLS_VERIFY` — whether the oracle HTTP client verifies
    /// TLS certificates. Default `true`; only ever set to `false` for
    /// local development against a self-signed stand-in.
    pub oracle_tls_verify: bool,
    /// `ADMIN_TOKEN` — bearer token gating parameter-store mutations
    /// (spec §4.C, "Authorization"). Absent disables all mutating
    /// parameter-store routes (they return 401 unconditionally).
    pub admin_token: Option<SecretToken>,
    /// `DEFAULT_COUNTRY` — fallback country code for tooling that needs
    /// one and the caller supplied none (the CLI's replay/demo paths).
    pub default_country: String,
}

impl AppConfig {
    /// Build configuration from the process environment. Unknown
    /// variables are ignored; recognized variables fall back to safe
    /// local-development defaults when unset.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            attestor_keys: std::env::var("ATTESTOR_KEYS")
                .unwrap_or_else(|_| "ed25519:v1:demo-seed-change-me".to_string()),
            attestor_active_kid: std::env::var("ATTESTOR_ACTIVE_KID").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            worldcheck_url: std::env::var("WORLDCHECK_URL").ok(),
            oracle_tls_verify: std::env::var("WORLDCHECK_TLS_VERIFY")
                .ok()
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            admin_token: std::env::var("ADMIN_TOKEN").ok().map(SecretToken::new),
            default_country: std::env::var("DEFAULT_COUNTRY").unwrap_or_else(|_| "US".to_string()),
        }
    }
}
