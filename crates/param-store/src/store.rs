//! # ParamStore — the Admin-Mutable Snapshot Backend
//!
//! Spec §4.C / §5: the kernel must read a consistent snapshot (snapshot
//! isolation or equivalent), and writes are serialized via admin
//! endpoints. Two implementations are provided behind the
//! [`ParamStore`] trait: an in-process [`InMemoryParamStore`] guarded by a
//! `tokio::sync::RwLock` (suitable for tests and single-process
//! deployments) and [`PostgresParamStore`], which persists thresholds and
//! the allowlist as rows so that multiple API replicas observe the same
//! parameters.

use crate::error::ParamStoreError;
use async_trait::async_trait;
use decision_core::CountryCode;
use policy_kernel::Parameters;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A source of truth for kernel parameters, read under a consistent
/// snapshot and mutated only through its own methods (never via a
/// read-then-write race at the caller).
#[async_trait]
pub trait ParamStore: Send + Sync {
    /// Read the current parameter snapshot.
    async fn snapshot(&self) -> Result<Parameters, ParamStoreError>;

    /// Upsert a threshold value, returning the new `param_hash`.
    async fn set_threshold(&self, key: &str, value: Decimal) -> Result<String, ParamStoreError>;

    /// Add or remove a country from the allowlist, returning the new
    /// `param_hash`.
    async fn set_allowlist(&self, country: &CountryCode, allow: bool) -> Result<String, ParamStoreError>;

    /// The current `param_hash`, without returning the full snapshot.
    async fn param_hash(&self) -> Result<String, ParamStoreError> {
        Ok(self.snapshot().await?.param_hash())
    }
}

/// An in-memory parameter store, initialized from [`Parameters::defaults`].
///
/// Grounded on the teacher's `AppState` placeholder pattern
/// (`msez-api/src/state.rs`): a small `Arc<RwLock<...>>`-wrapped piece of
/// shared state constructed once at startup and cloned cheaply into every
/// handler.
#[derive(Clone)]
pub struct InMemoryParamStore {
    inner: Arc<RwLock<Parameters>>,
}

impl InMemoryParamStore {
    /// Start from the default parameter snapshot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Parameters::defaults())),
        }
    }

    /// Start from a caller-supplied snapshot (used by tests that need a
    /// specific starting configuration).
    pub fn from_parameters(params: Parameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }
}

impl Default for InMemoryParamStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParamStore for InMemoryParamStore {
    async fn snapshot(&self) -> Result<Parameters, ParamStoreError> {
        Ok(self.inner.read().await.clone())
    }

    async fn set_threshold(&self, key: &str, value: Decimal) -> Result<String, ParamStoreError> {
        let mut guard = self.inner.write().await;
        guard.set_threshold(key.to_string(), value);
        Ok(guard.param_hash())
    }

    async fn set_allowlist(&self, country: &CountryCode, allow: bool) -> Result<String, ParamStoreError> {
        let mut guard = self.inner.write().await;
        if allow {
            guard.allow_country(country);
        } else {
            guard.disallow_country(country);
        }
        Ok(guard.param_hash())
    }
}

/// A Postgres-backed parameter store: thresholds live in
/// `params_thresholds(k text primary key, v numeric)` and the allowlist in
/// `params_allowlist(country text primary key)`, matching
/// `services/control/app.py`'s schema.
pub struct PostgresParamStore {
    pool: sqlx::PgPool,
}

impl PostgresParamStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParamStore for PostgresParamStore {
    async fn snapshot(&self) -> Result<Parameters, ParamStoreError> {
        let mut params = Parameters::empty();

        let thresholds = sqlx::query_as::<_, (String, Decimal)>("SELECT k, v FROM params_thresholds")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ParamStoreError::Unavailable(e.to_string()))?;
        for (k, v) in thresholds {
            params.set_threshold(k, v);
        }

        let countries = sqlx::query_as::<_, (String,)>("SELECT country FROM params_allowlist")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ParamStoreError::Unavailable(e.to_string()))?;
        for (country,) in countries {
            let code = CountryCode::new(&country)
                .map_err(|e| ParamStoreError::InvalidMutation(e.to_string()))?;
            params.allow_country(&code);
        }

        Ok(params)
    }

    async fn set_threshold(&self, key: &str, value: Decimal) -> Result<String, ParamStoreError> {
        sqlx::query(
            "INSERT INTO params_thresholds (k, v) VALUES ($1, $2)
             ON CONFLICT (k) DO UPDATE SET v = EXCLUDED.v",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| ParamStoreError::Unavailable(e.to_string()))?;

        self.param_hash().await
    }

    async fn set_allowlist(&self, country: &CountryCode, allow: bool) -> Result<String, ParamStoreError> {
        if allow {
            sqlx::query("INSERT INTO params_allowlist (country) VALUES ($1) ON CONFLICT DO NOTHING")
                .bind(country.as_str())
                .execute(&self.pool)
                .await
        } else {
            sqlx::query("DELETE FROM params_allowlist WHERE country = $1")
                .bind(country.as_str())
                .execute(&self.pool)
                .await
        }
        .map_err(|e| ParamStoreError::Unavailable(e.to_string()))?;

        self.param_hash().await
    }
}
