//! Upstream request description and cache signature

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// HTTP methods used against the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to the portal
///
/// For GET the params travel in the query string; for POST they are the
/// form-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub params: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            params: Vec::new(),
        }
    }

    pub fn post_form(url: Url) -> Self {
        Self {
            method: Method::Post,
            url,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Stable cache key: SHA-256 over method, URL and name-sorted params
    pub fn signature(&self) -> String {
        let mut params = self.params.clone();
        params.sort();

        let mut hasher = Sha256::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_str().as_bytes());
        for (name, value) in &params {
            hasher.update(b"\n");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if !self.params.is_empty() {
            let joined: Vec<String> = self
                .params
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            write!(f, " [{}]", joined.join("&"))?;
        }
        Ok(())
    }
}
