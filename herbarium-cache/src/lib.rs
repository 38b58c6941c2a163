//! Herbarium Cache - Content-addressed response cache
//!
//! Shields external sources from redundant network traffic. Requests
//! are addressed by a stable fingerprint of their normalized form;
//! stored responses are revalidated with HTTP validators rather than
//! evicted; concurrent callers for one fingerprint share a single
//! in-flight fetch.
//!
//! The HTTP transport itself is an externally supplied capability
//! behind the [`Transport`] trait.

mod http;
mod request;
mod storage;
pub mod testing;
mod transport;

pub use http::{CacheEntry, CachedPayload, FetchError, HttpCache, Validator};
pub use request::{CacheRequest, Method};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
