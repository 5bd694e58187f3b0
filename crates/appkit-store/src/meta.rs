//! Per-owner key-value metadata.
//!
//! Every app owns a metadata namespace of string keys mapping to JSON
//! values. Writes overwrite the whole value; there is no merge. The
//! [`MetadataStore`] trait is the seam the component store is built on:
//! [`SqliteMetadataStore`] persists to SQLite, [`InMemoryMetadataStore`]
//! keeps everything in a map and backs the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Identifier of the app owning a metadata namespace.
pub type AppId = u64;

/// Largest owner id a metadata facility accepts: SQLite stores ids as
/// signed 64-bit integers.
pub const MAX_APP_ID: AppId = i64::MAX as AppId;

/// Key-value metadata keyed by owner id and string key.
///
/// Owner ids above [`MAX_APP_ID`] are rejected with
/// [`StoreError::InvalidArgument`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never set.
    async fn get(&self, owner: AppId, key: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Store `value` under `key`, replacing whatever was there.
    async fn set(&self, owner: AppId, key: &str, value: serde_json::Value) -> StoreResult<()>;

    /// Remove `key`, returning `true` if it existed.
    async fn delete(&self, owner: AppId, key: &str) -> StoreResult<bool>;

    /// List the owners that have a value under `key`, ascending.
    async fn owners(&self, key: &str) -> StoreResult<Vec<AppId>>;
}

fn check_key(key: &str) -> StoreResult<()> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidArgument(
            "metadata key must not be empty".into(),
        ));
    }
    Ok(())
}

fn owner_param(owner: AppId) -> StoreResult<i64> {
    i64::try_from(owner)
        .map_err(|_| StoreError::InvalidArgument(format!("owner id {owner} is out of range")))
}

// ═══════════════════════════════════════════════════════════════════════
//  SQLite
// ═══════════════════════════════════════════════════════════════════════

/// Metadata persisted in the `app_meta` table.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    db: Database,
}

impl SqliteMetadataStore {
    /// Create a metadata store backed by `db`. Migrations must have run.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    #[instrument(skip(self))]
    async fn get(&self, owner: AppId, key: &str) -> StoreResult<Option<serde_json::Value>> {
        check_key(key)?;
        let owner_id = owner_param(owner)?;
        let key = key.to_string();
        let raw: Option<String> = self
            .db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT meta_value FROM app_meta WHERE owner_id = ?1 AND meta_key = ?2",
                    rusqlite::params![owner_id, key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, owner: AppId, key: &str, value: serde_json::Value) -> StoreResult<()> {
        check_key(key)?;
        let owner_id = owner_param(owner)?;
        let key = key.to_string();
        let encoded = serde_json::to_string(&value)?;
        let now = Utc::now().timestamp();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO app_meta (owner_id, meta_key, meta_value, updated_at) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(owner_id, meta_key) DO UPDATE SET \
                     meta_value = excluded.meta_value, updated_at = excluded.updated_at",
                    rusqlite::params![owner_id, key, encoded, now],
                )?;
                debug!(owner, key = %key, bytes = encoded.len(), "metadata updated");
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner: AppId, key: &str) -> StoreResult<bool> {
        check_key(key)?;
        let owner_id = owner_param(owner)?;
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM app_meta WHERE owner_id = ?1 AND meta_key = ?2",
                    rusqlite::params![owner_id, key],
                )?;
                Ok(deleted > 0)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn owners(&self, key: &str) -> StoreResult<Vec<AppId>> {
        check_key(key)?;
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT owner_id FROM app_meta WHERE meta_key = ?1 ORDER BY owner_id",
                )?;
                let ids = stmt
                    .query_map(rusqlite::params![key], |row| row.get::<_, i64>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids.into_iter()
                    .map(|id| {
                        AppId::try_from(id).map_err(|_| {
                            StoreError::InvalidArgument(format!("negative owner id {id} in app_meta"))
                        })
                    })
                    .collect()
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  In-memory
// ═══════════════════════════════════════════════════════════════════════

/// Metadata kept in a process-local map. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    entries: Mutex<HashMap<(AppId, String), serde_json::Value>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> StoreResult<std::sync::MutexGuard<'_, HashMap<(AppId, String), serde_json::Value>>> {
        self.entries
            .lock()
            .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(&self, owner: AppId, key: &str) -> StoreResult<Option<serde_json::Value>> {
        check_key(key)?;
        owner_param(owner)?;
        Ok(self.lock()?.get(&(owner, key.to_string())).cloned())
    }

    async fn set(&self, owner: AppId, key: &str, value: serde_json::Value) -> StoreResult<()> {
        check_key(key)?;
        owner_param(owner)?;
        self.lock()?.insert((owner, key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, owner: AppId, key: &str) -> StoreResult<bool> {
        check_key(key)?;
        owner_param(owner)?;
        Ok(self.lock()?.remove(&(owner, key.to_string())).is_some())
    }

    async fn owners(&self, key: &str) -> StoreResult<Vec<AppId>> {
        check_key(key)?;
        let mut owners: Vec<AppId> = self
            .lock()?
            .keys()
            .filter(|(_, k)| k == key)
            .map(|(owner, _)| *owner)
            .collect();
        owners.sort_unstable();
        Ok(owners)
    }
}

// ── tests ────────────────────────────────────────────────────────────
