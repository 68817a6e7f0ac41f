//! Cooldown store contract and backends.
//!
//! The store records the last successful trigger time per dedup key. The
//! engine only ever gets and puts individual keys; it never enumerates or
//! deletes. Records expire implicitly once `now - timestamp` reaches the
//! task's cooldown window. There is no transaction across concurrent
//! writers to the same key: two runs racing on one key may both trigger,
//! so the cooldown is a best-effort throttle (at-least-once), not a
//! correctness guarantee.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, TableDefinition};
use thiserror::Error;
use tokio::sync::RwLock;

/// Key: dedup key string. Value: RFC 3339 timestamp of the last successful
/// trigger.
const COOLDOWNS: TableDefinition<&str, &str> = TableDefinition::new("cooldowns");

/// Store access errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("cooldown store error: {0}")]
    Backend(String),

    /// A stored value could not be parsed as a timestamp.
    #[error("corrupt cooldown record under '{key}': {value}")]
    Corrupt { key: String, value: String },
}

/// Key-value contract consumed by the decision engine.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Last successful trigger time under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Record a successful trigger at `ts` under `key`, overwriting any
    /// previous record.
    async fn put(&self, key: &str, ts: DateTime<Utc>) -> Result<(), StoreError>;
}

fn parse_record(key: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Durable store backed by a single-table redb database.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the redb database at `path`.
    ///
    /// Creates the `cooldowns` table if it doesn't already exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        // Ensure the table exists before any reads
        let wt = db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        wt.open_table(COOLDOWNS)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        wt.commit().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl CooldownStore for RedbStore {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let table = rt
            .open_table(COOLDOWNS)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let entry = table
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match entry {
            Some(guard) => parse_record(key, guard.value()).map(Some),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, ts: DateTime<Utc>) -> Result<(), StoreError> {
        let value = ts.to_rfc3339();
        let wt = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let mut table = wt
                .open_table(COOLDOWNS)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            table
                .insert(key, value.as_str())
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        wt.commit().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// In-process store for tests and cooldown-free deployments.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CooldownStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.records.read().await.get(key).copied())
    }

    async fn put(&self, key: &str, ts: DateTime<Utc>) -> Result<(), StoreError> {
        self.records.write().await.insert(key.to_string(), ts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RedbStore) {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("cooldown.redb")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn redb_round_trip_returns_written_timestamp() {
        let (_dir, store) = open_tmp();
        // Sub-second precision survives the RFC 3339 round trip.
        let ts = Utc::now();
        store.put("cooldown:https://x/y:404", ts).await.unwrap();
        let got = store.get("cooldown:https://x/y:404").await.unwrap();
        assert_eq!(got, Some(ts));
    }

    #[tokio::test]
    async fn redb_absent_key_is_none() {
        let (_dir, store) = open_tmp();
        assert_eq!(store.get("cooldown:missing:0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn redb_put_overwrites_previous_record() {
        let (_dir, store) = open_tmp();
        let first = Utc::now() - chrono::Duration::hours(2);
        let second = Utc::now();
        store.put("k", first).await.unwrap();
        store.put("k", second).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn redb_reopen_preserves_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cooldown.redb");
        let ts = Utc::now();
        {
            let store = RedbStore::open(&path).unwrap();
            store.put("k", ts).await.unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(ts));
    }

    #[tokio::test]
    async fn redb_corrupt_value_surfaces_as_error() {
        let (_dir, store) = open_tmp();
        let wt = store.db.begin_write().unwrap();
        {
            let mut table = wt.open_table(COOLDOWNS).unwrap();
            table.insert("bad", "not-a-timestamp").unwrap();
        }
        wt.commit().unwrap();

        let err = store.get("bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn memory_round_trip() {
        let store = MemoryStore::new();
        let ts = Utc::now();
        store.put("k", ts).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(ts));
        assert_eq!(store.get("other").await.unwrap(), None);
    }
}
