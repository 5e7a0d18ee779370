//! TTL key-value cache backing the read-through AQI pipeline.
//!
//! A single SQLite table of `(key, payload, expires_at)` rows. Reads
//! treat expired rows as absent and delete them lazily; TTL expiry is
//! the only eviction mechanism; there is no LRU and no size bound.
//! Writes are upserts, so a refreshed entry replaces its predecessor.
//!
//! The cache is constructed explicitly and owned by the service layer;
//! there is no module-level client.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Prefix shared by every AQI cache key; used for administrative clears.
pub const AQI_KEY_PREFIX: &str = "aqi:";

/// Cache key for a city-name query. Normalized by trimming and
/// lowercasing so "Paris" and "paris " hit the same entry.
pub fn city_key(city: &str) -> String {
    format!("aqi:city:{}", city.trim().to_lowercase())
}

/// Cache key for a coordinate query.
pub fn coords_key(lat: f64, lon: f64) -> String {
    format!("aqi:coords:{lat},{lon}")
}

/// SQLite-backed key-value store with per-entry TTL.
#[derive(Clone)]
pub struct Cache {
    pool: SqlitePool,
}

impl Cache {
    /// Create a new cache instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:airsight.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let cache = Self { pool };
        cache.initialize_schema().await?;

        Ok(cache)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read a cached payload.
    ///
    /// Returns `None` if the key is missing or its TTL has elapsed.
    /// Expired rows are deleted on the way out.
    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.get_at(key, Utc::now()).await
    }

    /// Read with an explicit reference time.
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> anyhow::Result<Option<Vec<u8>>> {
        let row = sqlx::query(
            r#"
            SELECT payload, expires_at
            FROM cache_entries
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: i64 = row.get("expires_at");
        if expires_at <= now.timestamp() {
            // Lazy expiry; the row is stale and the next write replaces it anyway.
            sqlx::query("DELETE FROM cache_entries WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(row.get("payload")))
    }

    /// Write a payload with a TTL in seconds, replacing any existing
    /// entry for the key.
    pub async fn set_with_ttl(&self, key: &str, payload: &[u8], ttl_seconds: i64) -> anyhow::Result<()> {
        let expires_at = Utc::now().timestamp() + ttl_seconds;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, payload, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a single entry.
    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed. Used for administrative
    /// cache clears; normal operation relies on TTL expiry alone.
    pub async fn delete_by_prefix(&self, prefix: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key LIKE ?")
            .bind(format!("{prefix}%"))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
