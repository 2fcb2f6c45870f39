//! String-keyed persistent store
//!
//! The suggestion store persists through this boundary: string keys, JSON
//! string values, last-write-wins, no transactions assumed. The SQLite
//! implementation keeps everything in one `kv` table following the
//! key-value settings pattern.

use async_trait::async_trait;
use drobe_common::{Error, Result};
use sqlx::SqlitePool;

/// Persistent key-value boundary
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;

    /// All stored keys starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// SQLite-backed key-value store
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Create the store, initializing the `kv` table if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        // LIKE treats % and _ as wildcards; escape them so prefixes such
        // as "sugg_v3:" match literally
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{}%", escaped);

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM kv WHERE key LIKE ? ESCAPE '\\' ORDER BY key")
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> SqliteKeyValueStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        SqliteKeyValueStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = setup_store().await;
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = setup_store().await;
        store.put("k1", "v1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_put_is_last_write_wins() {
        let store = setup_store().await;
        store.put("k1", "old").await.unwrap();
        store.put("k1", "new").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup_store().await;
        store.put("k1", "v1").await.unwrap();
        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);

        // Deleting an absent key is not an error
        store.delete("k1").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = setup_store().await;
        store.put("sugg_v3:a:batch", "1").await.unwrap();
        store.put("sugg_v3:b:batch", "2").await.unwrap();
        store.put("sugg_v2:c:batch", "3").await.unwrap();
        store.put("other", "4").await.unwrap();

        let keys = store.keys_with_prefix("sugg_v3:").await.unwrap();
        assert_eq!(keys, vec!["sugg_v3:a:batch", "sugg_v3:b:batch"]);

        let all_generations = store.keys_with_prefix("sugg_v").await.unwrap();
        assert_eq!(all_generations.len(), 3);
    }

    #[tokio::test]
    async fn test_prefix_underscore_is_literal() {
        let store = setup_store().await;
        store.put("sugg_v3:x", "1").await.unwrap();
        // Would match "sugg_v3:" if _ were a wildcard
        store.put("suggXv3:y", "2").await.unwrap();

        let keys = store.keys_with_prefix("sugg_v3:").await.unwrap();
        assert_eq!(keys, vec!["sugg_v3:x"]);
    }
}
