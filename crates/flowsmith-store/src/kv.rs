//! Key-value store for persistent state.
//!
//! Stores string values under string keys in SQLite.  Besides plain get and
//! set, [`KvStore::update`] performs a read-modify-write inside one
//! `IMMEDIATE` transaction, so concurrent updates of the same key are
//! serialized instead of overwriting each other.

use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::StoreResult;

/// Persistent key-value store.
#[derive(Clone)]
pub struct KvStore {
    db: Database,
}

impl KvStore {
    /// Create a new store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a value by key, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_owned();
        self.db
            .execute(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv_state WHERE key = ?1",
                        rusqlite::params![key],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
    }

    /// Set a value for a key (insert or update).
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_owned();
        let value = value.to_owned();
        self.db
            .execute(move |conn| {
                upsert(conn, &key, &value)?;
                debug!(key = %key, "kv state updated");
                Ok(())
            })
            .await
    }

    /// Delete a key, returning `true` if it existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_owned();
        self.db
            .execute(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM kv_state WHERE key = ?1", rusqlite::params![key])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Atomically replace the value of `key` with `f(current)`.
    ///
    /// `f` runs inside the write transaction; returning an error rolls the
    /// transaction back and leaves the stored value unchanged.
    #[instrument(skip(self, f))]
    pub async fn update<F>(&self, key: &str, f: F) -> StoreResult<String>
    where
        F: FnOnce(Option<String>) -> StoreResult<String> + Send + 'static,
    {
        let key = key.to_owned();
        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let current: Option<String> = tx
                    .query_row(
                        "SELECT value FROM kv_state WHERE key = ?1",
                        rusqlite::params![key],
                        |row| row.get(0),
                    )
                    .optional()?;

                let next = f(current)?;
                upsert(&tx, &key, &next)?;
                tx.commit()?;

                debug!(key = %key, "kv state updated atomically");
                Ok(next)
            })
            .await
    }
}

fn upsert(conn: &rusqlite::Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, value, chrono::Utc::now().timestamp()],
    )
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    async fn setup_store() -> KvStore {
        let db = Database::in_memory().unwrap();
        KvStore::new(db)
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let store = setup_store().await;
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = setup_store().await;

        store.set("key1", "old").await.unwrap();
        store.set("key1", "new").await.unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = setup_store().await;

        store.set("key1", "val").await.unwrap();
        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert!(store.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_sees_current_value() {
        let store = setup_store().await;

        let first = store
            .update("counter", |current| {
                assert!(current.is_none());
                Ok("1".into())
            })
            .await
            .unwrap();
        assert_eq!(first, "1");

        let second = store
            .update("counter", |current| {
                let n: u32 = current.as_deref().unwrap_or("0").parse().unwrap();
                Ok((n + 1).to_string())
            })
            .await
            .unwrap();
        assert_eq!(second, "2");
    }

    #[tokio::test]
    async fn failed_update_leaves_value_unchanged() {
        let store = setup_store().await;
        store.set("key", "kept").await.unwrap();

        let result = store
            .update("key", |_| Err(StoreError::TaskJoin("refused".into())))
            .await;
        assert!(result.is_err());
        assert_eq!(store.get("key").await.unwrap(), Some("kept".to_string()));
    }
}
