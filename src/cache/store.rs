//! SQLite-backed response cache

use crate::cache::{CacheError, CacheResult, CachedResponse};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    key TEXT PRIMARY KEY,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    body TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);
"#;

/// Read-through store for upstream responses
pub struct ResponseCache {
    conn: Connection,
    ttl: Duration,
}

impl ResponseCache {
    /// Opens or creates the cache file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite cache file
    /// * `ttl_hours` - Freshness window in hours
    pub fn new(path: &Path, ttl_hours: u32) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(CACHE_SCHEMA_SQL)?;

        Ok(Self {
            conn,
            ttl: Duration::hours(i64::from(ttl_hours)),
        })
    }

    /// Creates an in-memory cache
    pub fn new_in_memory(ttl_hours: u32) -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CACHE_SCHEMA_SQL)?;

        Ok(Self {
            conn,
            ttl: Duration::hours(i64::from(ttl_hours)),
        })
    }

    /// Returns the cached response for `key` if it is still fresh
    pub fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT body, fetched_at FROM responses WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, fetched_str)) = row else {
            return Ok(None);
        };

        let fetched_at = fetched_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| CacheError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let cached = CachedResponse { body, fetched_at };
        if cached.is_stale(self.ttl) {
            return Ok(None);
        }

        Ok(Some(cached))
    }

    /// Stores a response, replacing any older entry for the same key
    pub fn put(&self, key: &str, method: &str, url: &str, body: &str) -> CacheResult<()> {
        self.put_at(key, method, url, body, Utc::now())
    }

    fn put_at(
        &self,
        key: &str,
        method: &str,
        url: &str,
        body: &str,
        fetched_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO responses (key, method, url, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, method, url, body, fetched_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Deletes entries older than the freshness window
    ///
    /// Returns the number of deleted entries.
    pub fn purge_stale(&self) -> CacheResult<usize> {
        let cutoff = (Utc::now() - self.ttl).to_rfc3339();
        let deleted = self
            .conn
            .execute("DELETE FROM responses WHERE fetched_at < ?1", params![cutoff])?;
        Ok(deleted)
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> CacheResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}
