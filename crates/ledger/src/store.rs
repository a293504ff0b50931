//! # Ledger & Anchor Storage
//!
//! Two traits: [`Ledger`] (the append-only decision ledger plus its
//! idempotency cache, committed together — spec §4.F, §5) and
//! [`AnchorStore`] (the anchor table the worker in [`crate::worker`]
//! writes to — spec §4.G). Each has an in-memory implementation (tests,
//! single-process demos) and a Postgres implementation.

use crate::error::LedgerError;
use crate::types::{AnchorRow, LedgerRow};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Fields needed to append a new ledger row; `id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewLedgerRow {
    pub kernel_id: String,
    pub param_hash: String,
    pub bundle_json: String,
    pub proof_id: String,
    pub certificate_jws: String,
    pub idempotency_key: String,
}

/// The result of an idempotent append: either this call committed a new
/// row, or a prior call already won the race and this call's caller
/// should return the previously cached response (spec §4.F, §9).
pub enum AppendOutcome {
    /// This call's row was newly committed.
    Committed(LedgerRow),
    /// Another request already committed under this `idempotency_key`;
    /// here is its cached response body to return instead.
    AlreadyExists { cached_response_json: String },
}

/// The append-only decision ledger and its idempotency cache.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a new row, transactionally with writing `response_json`
    /// into the idempotency cache under `row.idempotency_key`. On a
    /// unique-constraint race, both writes are discarded and the
    /// already-committed response is returned instead (spec §9:
    /// "treat the unique constraint ... as the single source of truth;
    /// do not try to pre-check with a read and then write").
    async fn append(&self, row: NewLedgerRow, response_json: String) -> Result<AppendOutcome, LedgerError>;

    /// Look up a previously cached response by idempotency key, without
    /// appending anything. Used by callers that want to short-circuit
    /// before evaluating the kernel at all (spec §4.C step 1).
    async fn cached_response(&self, idempotency_key: &str) -> Result<Option<String>, LedgerError>;

    /// Read ledger rows with `id` in `[from_id, to_id]`, ascending.
    async fn read_range(&self, from_id: i64, to_id: i64) -> Result<Vec<LedgerRow>, LedgerError>;

    /// Read up to `limit` rows with `id >= start_id`, ascending — the
    /// Anchor Worker's forward iterator (spec §4.F).
    async fn read_from(&self, start_id: i64, limit: i64) -> Result<Vec<LedgerRow>, LedgerError>;

    /// The highest assigned `id`, or 0 if the ledger is empty.
    async fn max_id(&self) -> Result<i64, LedgerError>;
}

/// Fields needed to append a new anchor row; `id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAnchorRow {
    pub from_id: i64,
    pub to_id: i64,
    pub merkle_root: String,
    pub kid: String,
    pub attestor_signature: String,
}

/// The anchor table: contiguous, monotonic, non-overlapping signed
/// Merkle roots over ledger ranges (spec §4.G).
#[async_trait]
pub trait AnchorStore: Send + Sync {
    /// The highest `to_id` committed so far, or 0 if no anchors exist.
    async fn max_to_id(&self) -> Result<i64, LedgerError>;

    /// Append a new, immutable anchor row.
    async fn append(&self, anchor: NewAnchorRow) -> Result<AnchorRow, LedgerError>;

    /// List every anchor, ascending by `from_id` — used to verify the
    /// anchor-coverage invariant (spec §8).
    async fn list(&self) -> Result<Vec<AnchorRow>, LedgerError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

struct InMemoryLedgerState {
    rows: Vec<LedgerRow>,
    by_idempotency_key: BTreeMap<String, usize>,
    idempotency_cache: BTreeMap<String, String>,
    next_id: i64,
}

/// An in-memory ledger, single-process only. Enforces the
/// `idempotency_key` uniqueness constraint via a `Mutex`-guarded map,
/// standing in for the database's unique index.
pub struct InMemoryLedger {
    state: Mutex<InMemoryLedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryLedgerState {
                rows: Vec::new(),
                by_idempotency_key: BTreeMap::new(),
                idempotency_cache: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn append(&self, row: NewLedgerRow, response_json: String) -> Result<AppendOutcome, LedgerError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");

        if let Some(cached) = state.idempotency_cache.get(&row.idempotency_key) {
            return Ok(AppendOutcome::AlreadyExists {
                cached_response_json: cached.clone(),
            });
        }

        let id = state.next_id;
        state.next_id += 1;
        let committed = LedgerRow {
            id,
            kernel_id: row.kernel_id,
            param_hash: row.param_hash,
            bundle_json: row.bundle_json,
            proof_id: row.proof_id,
            certificate_jws: row.certificate_jws,
            idempotency_key: row.idempotency_key.clone(),
            created_at: Utc::now(),
        };
        state.rows.push(committed.clone());
        let idx = state.rows.len() - 1;
        state.by_idempotency_key.insert(row.idempotency_key.clone(), idx);
        state.idempotency_cache.insert(row.idempotency_key, response_json);

        Ok(AppendOutcome::Committed(committed))
    }

    async fn cached_response(&self, idempotency_key: &str) -> Result<Option<String>, LedgerError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state.idempotency_cache.get(idempotency_key).cloned())
    }

    async fn read_range(&self, from_id: i64, to_id: i64) -> Result<Vec<LedgerRow>, LedgerError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state
            .rows
            .iter()
            .filter(|r| r.id >= from_id && r.id <= to_id)
            .cloned()
            .collect())
    }

    async fn read_from(&self, start_id: i64, limit: i64) -> Result<Vec<LedgerRow>, LedgerError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state
            .rows
            .iter()
            .filter(|r| r.id >= start_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn max_id(&self) -> Result<i64, LedgerError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(state.rows.last().map(|r| r.id).unwrap_or(0))
    }
}

struct InMemoryAnchorState {
    anchors: Vec<AnchorRow>,
    next_id: i64,
}

/// An in-memory anchor table.
pub struct InMemoryAnchorStore {
    state: Mutex<InMemoryAnchorState>,
}

impl InMemoryAnchorStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryAnchorState {
                anchors: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryAnchorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnchorStore for InMemoryAnchorStore {
    async fn max_to_id(&self) -> Result<i64, LedgerError> {
        let state = self.state.lock().expect("anchor mutex poisoned");
        Ok(state.anchors.last().map(|a| a.to_id).unwrap_or(0))
    }

    async fn append(&self, anchor: NewAnchorRow) -> Result<AnchorRow, LedgerError> {
        let mut state = self.state.lock().expect("anchor mutex poisoned");
        let id = state.next_id;
        state.next_id += 1;
        let row = AnchorRow {
            id,
            from_id: anchor.from_id,
            to_id: anchor.to_id,
            merkle_root: anchor.merkle_root,
            kid: anchor.kid,
            attestor_signature: anchor.attestor_signature,
            created_at: Utc::now(),
        };
        state.anchors.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<AnchorRow>, LedgerError> {
        let state = self.state.lock().expect("anchor mutex poisoned");
        Ok(state.anchors.clone())
    }
}

// ---------------------------------------------------------------------------
// Postgres implementations
// ---------------------------------------------------------------------------

/// A Postgres-backed ledger. Schema matches `api/migrations` (`id bigserial
/// primary key, idempotency_key text unique, ...`).
pub struct PostgresLedger {
    pool: sqlx::PgPool,
}

impl PostgresLedger {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn append(&self, row: NewLedgerRow, response_json: String) -> Result<AppendOutcome, LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let inserted = sqlx::query_as::<_, (i64, chrono::DateTime<Utc>)>(
            "INSERT INTO decision_ledger
                (kernel_id, param_hash, bundle_json, proof_id, certificate_jws, idempotency_key)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (idempotency_key) DO NOTHING
             RETURNING id, created_at",
        )
        .bind(&row.kernel_id)
        .bind(&row.param_hash)
        .bind(&row.bundle_json)
        .bind(&row.proof_id)
        .bind(&row.certificate_jws)
        .bind(&row.idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let Some((id, created_at)) = inserted else {
            tx.rollback().await.ok();
            let cached = self.cached_response(&row.idempotency_key).await?;
            return match cached {
                Some(cached_response_json) => Ok(AppendOutcome::AlreadyExists { cached_response_json }),
                None => Err(LedgerError::Unavailable(
                    "idempotency race lost but no cached response found".into(),
                )),
            };
        };

        sqlx::query(
            "INSERT INTO idempotency (id_key, response) VALUES ($1, $2)
             ON CONFLICT (id_key) DO NOTHING",
        )
        .bind(&row.idempotency_key)
        .bind(&response_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        tx.commit().await.map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(AppendOutcome::Committed(LedgerRow {
            id,
            kernel_id: row.kernel_id,
            param_hash: row.param_hash,
            bundle_json: row.bundle_json,
            proof_id: row.proof_id,
            certificate_jws: row.certificate_jws,
            idempotency_key: row.idempotency_key,
            created_at,
        }))
    }

    async fn cached_response(&self, idempotency_key: &str) -> Result<Option<String>, LedgerError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT response FROM idempotency WHERE id_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(row.map(|(r,)| r))
    }

    async fn read_range(&self, from_id: i64, to_id: i64) -> Result<Vec<LedgerRow>, LedgerError> {
        sqlx::query_as::<_, LedgerRow>(
            "SELECT id, kernel_id, param_hash, bundle_json, proof_id, certificate_jws, idempotency_key, created_at
             FROM decision_ledger WHERE id >= $1 AND id <= $2 ORDER BY id ASC",
        )
        .bind(from_id)
        .bind(to_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    async fn read_from(&self, start_id: i64, limit: i64) -> Result<Vec<LedgerRow>, LedgerError> {
        sqlx::query_as::<_, LedgerRow>(
            "SELECT id, kernel_id, param_hash, bundle_json, proof_id, certificate_jws, idempotency_key, created_at
             FROM decision_ledger WHERE id >= $1 ORDER BY id ASC LIMIT $2",
        )
        .bind(start_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    async fn max_id(&self) -> Result<i64, LedgerError> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT max(id) FROM decision_ledger")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(max.unwrap_or(0))
    }
}

/// A Postgres-backed anchor table.
pub struct PostgresAnchorStore {
    pool: sqlx::PgPool,
}

impl PostgresAnchorStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnchorStore for PostgresAnchorStore {
    async fn max_to_id(&self) -> Result<i64, LedgerError> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT max(to_id) FROM anchors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(max.unwrap_or(0))
    }

    async fn append(&self, anchor: NewAnchorRow) -> Result<AnchorRow, LedgerError> {
        sqlx::query_as::<_, AnchorRow>(
            "INSERT INTO anchors (from_id, to_id, merkle_root, kid, attestor_signature)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, from_id, to_id, merkle_root, kid, attestor_signature, created_at",
        )
        .bind(anchor.from_id)
        .bind(anchor.to_id)
        .bind(&anchor.merkle_root)
        .bind(&anchor.kid)
        .bind(&anchor.attestor_signature)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<AnchorRow>, LedgerError> {
        sqlx::query_as::<_, AnchorRow>(
            "SELECT id, from_id, to_id, merkle_root, kid, attestor_signature, created_at
             FROM anchors ORDER BY from_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(idem_key: &str) -> NewLedgerRow {
        NewLedgerRow {
            kernel_id: "refund-kernel-v1".to_string(),
            param_hash: "deadbeef".to_string(),
            bundle_json: "{}".to_string(),
            proof_id: "abc123".to_string(),
            certificate_jws: "h.p.s".to_string(),
            idempotency_key: idem_key.to_string(),
        }
    }

    #[tokio::test]
    async fn append_assigns_monotonic_ids() {
        let ledger = InMemoryLedger::new();
        let a = ledger.append(sample_row("k1"), "r1".into()).await.unwrap();
        let b = ledger.append(sample_row("k2"), "r2".into()).await.unwrap();
        let (id_a, id_b) = match (a, b) {
            (AppendOutcome::Committed(a), AppendOutcome::Committed(b)) => (a.id, b.id),
            _ => panic!("expected both committed"),
        };
        assert!(id_b > id_a);
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_returns_cached_response() {
        let ledger = InMemoryLedger::new();
        ledger.append(sample_row("same"), "first-response".into()).await.unwrap();
        let second = ledger.append(sample_row("same"), "second-response".into()).await.unwrap();
        match second {
            AppendOutcome::AlreadyExists { cached_response_json } => {
                assert_eq!(cached_response_json, "first-response");
            }
            AppendOutcome::Committed(_) => panic!("expected a race loss"),
        }
    }

    #[tokio::test]
    async fn read_range_and_read_from_agree() {
        let ledger = InMemoryLedger::new();
        for i in 0..5 {
            ledger.append(sample_row(&format!("k{i}")), "r".into()).await.unwrap();
        }
        let ranged = ledger.read_range(2, 4).await.unwrap();
        assert_eq!(ranged.len(), 3);
        let from = ledger.read_from(2, 3).await.unwrap();
        assert_eq!(from.len(), 3);
        assert_eq!(from[0].id, 2);
    }

    #[tokio::test]
    async fn max_id_reflects_latest_commit() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.max_id().await.unwrap(), 0);
        ledger.append(sample_row("k1"), "r".into()).await.unwrap();
        assert_eq!(ledger.max_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn anchor_store_tracks_contiguous_ranges() {
        let anchors = InMemoryAnchorStore::new();
        assert_eq!(anchors.max_to_id().await.unwrap(), 0);
        anchors
            .append(NewAnchorRow {
                from_id: 1,
                to_id: 10,
                merkle_root: "root1".into(),
                kid: "k1".into(),
                attestor_signature: "sig1".into(),
            })
            .await
            .unwrap();
        assert_eq!(anchors.max_to_id().await.unwrap(), 10);
        let list = anchors.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].from_id, 1);
    }
}
