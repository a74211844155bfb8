use serde::Deserialize;

/// Main configuration structure for Crash-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub client: ClientConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Endpoints and form fields of the reporting portal
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Search form endpoint (GET lists categories, POST runs a search)
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Detail page endpoint for a single incident
    #[serde(rename = "detail-url")]
    pub detail_url: String,

    /// Query parameter carrying the incident identifier
    #[serde(rename = "id-param", default = "default_id_param")]
    pub id_param: String,

    /// Form field carrying the category code of a search
    #[serde(rename = "category-field", default = "default_category_field")]
    pub category_field: String,
}

/// HTTP client identification and timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Crawl pacing and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between consecutive network requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Extra attempts for a request whose upstream was unavailable
    #[serde(rename = "retry-attempts", default)]
    pub retry_attempts: u32,

    /// Base backoff between attempts, multiplied by the attempt number (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            retry_attempts: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Response cache location and freshness window
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite response cache
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// Hours a cached response stays fresh
    #[serde(rename = "ttl-hours", default = "default_ttl_hours")]
    pub ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite record database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_id_param() -> String {
    "ACC_RPT_NUM".to_string()
}

fn default_category_field() -> String {
    "searchInjury".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    3000
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_cache_path() -> String {
    "http_cache.db".to_string()
}

fn default_ttl_hours() -> u32 {
    24
}

fn default_database_path() -> String {
    "crashes.db".to_string()
}
