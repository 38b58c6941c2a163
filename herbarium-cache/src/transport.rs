//! HTTP transport abstraction
//!
//! The cache consumes transports through this trait; the bundled
//! implementation rides on reqwest's blocking client. Transports report
//! raw status codes - deciding what a non-success status means is the
//! cache's job.

use crate::{FetchError, Method};
use std::time::Duration;

/// One outgoing request as the transport sees it
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Fully normalized URL, query included
    pub url: String,
    /// Extra request headers (conditional validators)
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// The subset of a response the cache cares about
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub body: Vec<u8>,
}

/// Externally supplied fetch capability
pub trait Transport: Send + Sync {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, FetchError>;
}

/// Blocking reqwest transport
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

fn header_string(response: &reqwest::blocking::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_type = header_string(&response, "content-type");
        let etag = header_string(&response, "etag");
        let last_modified = header_string(&response, "last-modified");
        let cache_control = header_string(&response, "cache-control");
        let expires = header_string(&response, "expires");

        let body = response
            .bytes()
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(err.to_string())
                }
            })?
            .to_vec();

        Ok(TransportResponse {
            status,
            content_type,
            etag,
            last_modified,
            cache_control,
            expires,
            body,
        })
    }
}
