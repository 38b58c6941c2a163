//! Scripted transports for tests
//!
//! A call-counting transport with canned responses, used by this
//! crate's own tests and by source tests in dependent crates.

use crate::{CacheRequest, FetchError, Transport, TransportRequest, TransportResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Builder for canned responses
#[derive(Debug, Clone)]
pub struct ScriptedResponse(TransportResponse);

impl ScriptedResponse {
    pub fn ok(body: &[u8]) -> Self {
        Self(TransportResponse {
            status: 200,
            body: body.to_vec(),
            ..TransportResponse::default()
        })
    }

    pub fn status(status: u16) -> Self {
        Self(TransportResponse {
            status,
            ..TransportResponse::default()
        })
    }

    pub fn not_modified() -> Self {
        Self::status(304)
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.0.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_etag(mut self, tag: &str) -> Self {
        self.0.etag = Some(tag.to_string());
        self
    }

    pub fn with_last_modified(mut self, stamp: &str) -> Self {
        self.0.last_modified = Some(stamp.to_string());
        self
    }

    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.0.cache_control = Some(format!("max-age={seconds}"));
        self
    }
}

/// Canned-response transport with a call counter
///
/// Responses for one request are consumed in order; the last one
/// repeats. Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<TransportResponse>>>,
    headers_seen: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `send`, widening the window in which a second
    /// caller can pile onto the same in-flight fetch
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Queue a response for a request
    pub fn respond(&self, request: &CacheRequest, response: ScriptedResponse) {
        let key = route_key(request);
        let mut routes = self.routes.lock().expect("routes lock");
        routes.entry(key).or_default().push_back(response.0);
    }

    /// Total number of `send` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Headers carried by the most recent request
    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.headers_seen.lock().expect("headers lock").clone()
    }
}

fn route_key(request: &CacheRequest) -> String {
    let url = request.full_url().expect("scripted request url");
    format!("{} {}", request.method(), url)
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.headers_seen.lock().expect("headers lock") = request.headers.clone();
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let key = format!("{} {}", request.method, request.url);
        let mut routes = self.routes.lock().expect("routes lock");
        match routes.get_mut(&key) {
            Some(queue) => {
                let response = if queue.len() > 1 {
                    queue.pop_front().unwrap_or_default()
                } else {
                    queue.front().cloned().unwrap_or_default()
                };
                Ok(response)
            }
            None => Ok(TransportResponse {
                status: 404,
                ..TransportResponse::default()
            }),
        }
    }
}
