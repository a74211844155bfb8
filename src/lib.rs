//! Crash-Harvest: an incremental harvester for public crash reports
//!
//! This crate enumerates the injury categories of a crash reporting portal,
//! collects the incident identifiers listed under each category, parses every
//! new incident's detail page into crash, vehicle and injury records, and
//! stores them so that repeated runs only fetch what is not stored yet.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod incident;
pub mod output;
pub mod report;
pub mod storage;

use thiserror::Error;

/// Main error type for Crash-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream unavailable for {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("Category catalog format error: {0}")]
    CatalogFormat(String),

    #[error("Listing format error: {0}")]
    ListingFormat(String),

    #[error("Report format error: {0}")]
    ReportFormat(#[from] report::ReportFormatError),

    #[error("Incident already stored: {0}")]
    DuplicateIncident(String),

    #[error("Storage error: {0}")]
    Storage(storage::StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

impl From<storage::StorageError> for HarvestError {
    fn from(err: storage::StorageError) -> Self {
        match err {
            storage::StorageError::DuplicateIncident(id) => Self::DuplicateIncident(id),
            other => Self::Storage(other),
        }
    }
}

impl HarvestError {
    /// Returns true for failures that a later attempt may not repeat
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Crash-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator};
pub use incident::IncidentId;
pub use output::RunSummary;
pub use report::{parse_report, ParsedReport};
pub use storage::{RecordStore, SqliteStorage};
