//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - Serving repeated requests from the response cache
//! - Classifying non-success responses as upstream failures
//!
//! Cache lookup, network send and cache write are separate steps so the
//! caller can pace exactly the requests that reach the network.

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::crawler::request::{Method, UpstreamRequest};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use crash_harvest::config::ClientConfig;
/// use crash_harvest::crawler::build_http_client;
///
/// let config = ClientConfig {
///     user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
///     timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP client paired with the response cache
pub struct Fetcher {
    client: Client,
    cache: ResponseCache,
}

impl Fetcher {
    pub fn new(client: Client, cache: ResponseCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Returns the cached body of a request if a fresh copy exists
    pub fn cached(&self, request: &UpstreamRequest) -> Result<Option<String>> {
        let Some(cached) = self.cache.get(&request.signature())? else {
            return Ok(None);
        };
        tracing::debug!("Cache hit for {} (age {}s)", request, cached.age().num_seconds());
        Ok(Some(cached.body))
    }

    /// Stores a successful response body under the request signature
    ///
    /// A failed cache write is logged and otherwise ignored; the body is
    /// still good.
    pub fn store(&self, request: &UpstreamRequest, body: &str) {
        if let Err(e) = self.cache.put(
            &request.signature(),
            request.method.as_str(),
            request.url.as_str(),
            body,
        ) {
            tracing::warn!("Failed to cache response for {}: {}", request, e);
        }
    }

    /// Issues the request over the network, bypassing the cache
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 2xx | response body |
    /// | Other HTTP status | `UpstreamUnavailable` |
    /// | Timeout / connect / body error | `UpstreamUnavailable` |
    pub async fn send(&self, request: &UpstreamRequest) -> Result<String> {
        tracing::debug!("Requesting {}", request);

        let builder = match request.method {
            Method::Get => self.client.get(request.url.clone()).query(&request.params),
            Method::Post => self.client.post(request.url.clone()).form(&request.params),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| unavailable(request, describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(request, format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| unavailable(request, e.to_string()))
    }
}

fn unavailable(request: &UpstreamRequest, reason: String) -> HarvestError {
    HarvestError::UpstreamUnavailable {
        url: request.url.to_string(),
        reason,
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> ClientConfig {
        ClientConfig {
            user_agent: "TestAgent/1.0".to_string(),
            timeout_secs: 5,
        }
    }

    fn fetcher() -> Fetcher {
        let client = build_http_client(&create_test_config()).unwrap();
        Fetcher::new(client, ResponseCache::new_in_memory(24).unwrap())
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_send_then_store_serves_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail"))
            .and(query_param("ACC_RPT_NUM", "AB123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>AB123</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let request = UpstreamRequest::get(Url::parse(&format!("{}/detail", server.uri())).unwrap())
            .param("ACC_RPT_NUM", "AB123");

        assert_eq!(fetcher.cached(&request).unwrap(), None);

        let body = fetcher.send(&request).await.unwrap();
        assert_eq!(body, "<html>AB123</html>");
        fetcher.store(&request, &body);

        assert_eq!(fetcher.cached(&request).unwrap(), Some(body));
    }

    #[tokio::test]
    async fn test_post_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_string_contains("searchInjury=FATAL"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let request =
            UpstreamRequest::post_form(Url::parse(&format!("{}/search", server.uri())).unwrap())
                .param("searchInjury", "FATAL");

        let body = fetcher.send(&request).await.unwrap();
        assert_eq!(body, "<table></table>");
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let request = UpstreamRequest::get(Url::parse(&format!("{}/detail", server.uri())).unwrap());

        let err = fetcher.send(&request).await.unwrap_err();
        assert!(
            matches!(err, HarvestError::UpstreamUnavailable { ref reason, .. } if reason == "HTTP 503")
        );
        assert!(fetcher.cache().is_empty().unwrap());
    }

    #[test]
    fn test_failed_cache_write_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("http_cache.db");
        let cache = ResponseCache::new(&cache_path, 24).unwrap();
        rusqlite::Connection::open(&cache_path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_writes BEFORE INSERT ON responses
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let client = build_http_client(&create_test_config()).unwrap();
        let fetcher = Fetcher::new(client, cache);
        let request = UpstreamRequest::get(Url::parse("https://portal.example.gov/detail").unwrap());

        fetcher.store(&request, "<html></html>");
        assert_eq!(fetcher.cached(&request).unwrap(), None);
    }
}
