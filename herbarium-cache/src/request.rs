//! Cacheable requests and their fingerprints
//!
//! A request is a method, a normalized URL and sorted query parameters.
//! The fingerprint is a stable SHA-256 over that normalized form, so
//! equivalent requests collapse onto the same cache entry.

use crate::FetchError;
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// HTTP method of a cacheable request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request addressed by content, not by call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    method: Method,
    url: String,
    params: Vec<(String, String)>,
}

impl CacheRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The normalized URL with query parameters sorted by key, then
    /// value
    ///
    /// Normalization (lowercased scheme and host, default port dropped)
    /// comes from the `url` parser.
    pub fn full_url(&self) -> Result<String, FetchError> {
        let mut url = Url::parse(&self.url)
            .map_err(|err| FetchError::Network(format!("invalid url {}: {err}", self.url)))?;

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .chain(self.params.iter().cloned())
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
        Ok(url.to_string())
    }

    /// Stable hash of the normalized request form
    pub fn fingerprint(&self) -> Result<String, FetchError> {
        let full_url = self.full_url()?;
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(full_url.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}
