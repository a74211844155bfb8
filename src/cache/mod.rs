//! Response cache
//!
//! Successful upstream responses are kept in a SQLite file keyed by the
//! request signature, and served again while they are younger than the
//! freshness window (24 hours unless configured otherwise).

mod store;

pub use store::ResponseCache;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors that can occur while reading or writing the cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt cache entry {key}: {message}")]
    Corrupt { key: String, message: String },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A stored response body and when it was fetched
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(body: String) -> Self {
        Self {
            body,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the response is older than the freshness window
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    /// How long ago the response was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}
