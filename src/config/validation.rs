use crate::config::types::{CacheConfig, ClientConfig, Config, CrawlerConfig, OutputConfig, SourceConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_source_config(&config.source)?;
    validate_client_config(&config.client)?;
    validate_crawler_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the portal endpoints and field names
fn validate_source_config(config: &SourceConfig) -> ConfigResult<()> {
    validate_endpoint("search-url", &config.search_url)?;
    validate_endpoint("detail-url", &config.detail_url)?;

    if config.id_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "id-param cannot be empty".to_string(),
        ));
    }

    if config.category_field.trim().is_empty() {
        return Err(ConfigError::Validation(
            "category-field cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that an endpoint is an absolute http(s) URL
fn validate_endpoint(name: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Validates client identification
fn validate_client_config(config: &ClientConfig) -> ConfigResult<()> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !config
        .user_agent
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control())
    {
        return Err(ConfigError::Validation(format!(
            "user-agent must be printable ASCII, got '{}'",
            config.user_agent
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Ten minutes
const MAX_RETRY_DELAY_MS: u64 = 600_000;

/// Validates pacing and retry limits
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be <= 10, got {}",
            config.retry_attempts
        )));
    }

    if config.retry_delay_ms > MAX_RETRY_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "retry-delay-ms must be <= {}, got {}",
            MAX_RETRY_DELAY_MS, config.retry_delay_ms
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }

    if config.ttl_hours < 1 {
        return Err(ConfigError::Validation(
            "ttl-hours must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
