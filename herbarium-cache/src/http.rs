//! Revalidating response cache
//!
//! Every network fetch of a source goes through [`HttpCache::fetch`].
//! Fresh entries are served without touching the transport; stale
//! entries are revalidated with the stored validator; misses fetch
//! unconditionally. Concurrent callers for one fingerprint collapse
//! onto a single in-flight transport call.

use crate::{CacheRequest, Storage, Transport, TransportRequest, TransportResponse};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const RFC_1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// Fetch failure, propagated unchanged to the calling source
///
/// This layer performs no retries; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Freshness token stored alongside a cached payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validator {
    ETag(String),
    LastModified(String),
}

/// One cached response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub content_type: Option<String>,
    pub validator: Option<Validator>,
    pub fetched_at: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn from_response(response: &TransportResponse, now: DateTime<Utc>) -> Self {
        let validator = response
            .etag
            .clone()
            .map(Validator::ETag)
            .or_else(|| response.last_modified.clone().map(Validator::LastModified));
        CacheEntry {
            payload: response.body.clone(),
            content_type: response.content_type.clone(),
            validator,
            fetched_at: now,
            expires: parse_expiry(response, now),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| now < expires)
    }

    fn conditional_header(&self) -> (String, String) {
        match &self.validator {
            Some(Validator::ETag(tag)) => ("If-None-Match".to_string(), tag.clone()),
            Some(Validator::LastModified(stamp)) => {
                ("If-Modified-Since".to_string(), stamp.clone())
            }
            // No validator at all: revalidate against the fetch time.
            None => (
                "If-Modified-Since".to_string(),
                self.fetched_at.format(RFC_1123_FORMAT).to_string(),
            ),
        }
    }
}

/// Payload handed back to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    pub payload: Vec<u8>,
    pub content_type: Option<String>,
}

impl From<&CacheEntry> for CachedPayload {
    fn from(entry: &CacheEntry) -> Self {
        CachedPayload {
            payload: entry.payload.clone(),
            content_type: entry.content_type.clone(),
        }
    }
}

/// Parse `Cache-Control: max-age` or `Expires` into an expiry instant
fn parse_expiry(response: &TransportResponse, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(cache_control) = &response.cache_control {
        for part in cache_control.split(',') {
            let part = part.trim();
            if let Some(seconds) = part.strip_prefix("max-age=") {
                let seconds: i64 = seconds.parse().ok()?;
                return Some(now + ChronoDuration::seconds(seconds));
            }
        }
    }
    response
        .expires
        .as_deref()
        .and_then(parse_http_timestamp)
}

/// Parse an HTTP timestamp as RFC 2616 (RFC 1123, falling back to RFC 850)
fn parse_http_timestamp(header: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(header, RFC_1123_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(header, RFC_850_FORMAT))
        .map(|naive| naive.and_utc())
        .ok()
}

/// Result slot shared between the in-flight leader and its followers
struct Flight {
    result: Mutex<Option<Result<CachedPayload, FetchError>>>,
    ready: Condvar,
}

impl Flight {
    fn new() -> Self {
        Flight {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, result: Result<CachedPayload, FetchError>) {
        let mut slot = lock_or_recover(&self.result);
        *slot = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<CachedPayload, FetchError> {
        let mut slot = lock_or_recover(&self.result);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = match self.ready.wait(slot) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Content-addressed response cache
pub struct HttpCache {
    transport: Arc<dyn Transport>,
    storage: Mutex<Box<dyn Storage>>,
    flights: Mutex<HashMap<String, Arc<Flight>>>,
    timeout: Duration,
}

impl HttpCache {
    pub fn new(transport: Arc<dyn Transport>, storage: Box<dyn Storage>, timeout: Duration) -> Self {
        HttpCache {
            transport,
            storage: Mutex::new(storage),
            flights: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Fetch a request through the cache
    ///
    /// At most one transport call per fingerprint is in flight at a
    /// time; concurrent callers wait for and share its result.
    pub fn fetch(&self, request: &CacheRequest) -> Result<CachedPayload, FetchError> {
        let fingerprint = request.fingerprint()?;

        if let Some(entry) = self.load_entry(&fingerprint) {
            if entry.is_fresh(Utc::now()) {
                debug!(%fingerprint, "cache hit (fresh)");
                return Ok(CachedPayload::from(&entry));
            }
        }

        enum Role {
            Leader(Arc<Flight>),
            Follower(Arc<Flight>),
        }

        let role = {
            let mut flights = lock_or_recover(&self.flights);
            match flights.get(&fingerprint) {
                Some(flight) => Role::Follower(flight.clone()),
                None => {
                    let flight = Arc::new(Flight::new());
                    flights.insert(fingerprint.clone(), flight.clone());
                    Role::Leader(flight)
                }
            }
        };

        match role {
            Role::Follower(flight) => {
                debug!(%fingerprint, "waiting on in-flight fetch");
                flight.wait()
            }
            Role::Leader(flight) => {
                let result = self.fetch_through(request, &fingerprint);
                flight.publish(result.clone());
                lock_or_recover(&self.flights).remove(&fingerprint);
                result
            }
        }
    }

    /// Drop every stored entry
    pub fn clear(&self) {
        lock_or_recover(&self.storage).clear();
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        lock_or_recover(&self.storage).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_entry(&self, fingerprint: &str) -> Option<CacheEntry> {
        let raw = lock_or_recover(&self.storage).get(fingerprint)?;
        match serde_json::from_slice(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%fingerprint, %err, "discarding undecodable cache entry");
                lock_or_recover(&self.storage).remove(fingerprint);
                None
            }
        }
    }

    fn store_entry(&self, fingerprint: &str, entry: &CacheEntry) {
        match serde_json::to_vec(entry) {
            Ok(raw) => {
                if let Err(err) = lock_or_recover(&self.storage).set(fingerprint, &raw) {
                    warn!(%fingerprint, %err, "cannot persist cache entry");
                }
            }
            Err(err) => warn!(%fingerprint, %err, "cannot encode cache entry"),
        }
    }

    /// The leader's path: revalidate or fetch, then store
    fn fetch_through(
        &self,
        request: &CacheRequest,
        fingerprint: &str,
    ) -> Result<CachedPayload, FetchError> {
        let now = Utc::now();
        let entry = self.load_entry(fingerprint);

        // A previous leader may have refreshed the entry while this
        // caller was acquiring the flight table.
        if let Some(entry) = &entry {
            if entry.is_fresh(now) {
                return Ok(CachedPayload::from(entry));
            }
        }

        let mut headers = Vec::new();
        if let Some(entry) = &entry {
            headers.push(entry.conditional_header());
        }

        let response = self.transport.send(&TransportRequest {
            method: request.method(),
            url: request.full_url()?,
            headers,
            timeout: self.timeout,
        })?;

        match response.status {
            304 => match entry {
                Some(mut entry) => {
                    debug!(%fingerprint, "revalidated, payload unchanged");
                    entry.fetched_at = now;
                    entry.expires = parse_expiry(&response, now).or(entry.expires);
                    let payload = CachedPayload::from(&entry);
                    self.store_entry(fingerprint, &entry);
                    Ok(payload)
                }
                // 304 without a stored entry: nothing to serve.
                None => Err(FetchError::Status(304)),
            },
            status if (200..300).contains(&status) => {
                debug!(%fingerprint, status, "fetched and stored");
                let entry = CacheEntry::from_response(&response, now);
                let payload = CachedPayload::from(&entry);
                self.store_entry(fingerprint, &entry);
                Ok(payload)
            }
            status => Err(FetchError::Status(status)),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
