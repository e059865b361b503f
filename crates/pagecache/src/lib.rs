//! # pagecache
//!
//! Response caching for axum routers with request coalescing.
//!
//! This crate provides:
//! - Cache key generation from the request target
//! - Pluggable storage backends (in-process and Redis) with TTL semantics
//! - Pluggable encodings for cached entries (JSON, gzip-compressed JSON)
//! - A response recorder that tees the downstream body into a buffer
//! - A coalescing group so concurrent misses for one key run the handler once
//! - The [`ResponseCache`] middleware tying it all together
//!
//! # Example
//!
//! ```ignore
//! use std::{sync::Arc, time::Duration};
//! use axum::{Router, middleware, routing::get};
//! use pagecache::{MemoryStore, ResponseCache, cache_middleware};
//!
//! let cache = ResponseCache::builder(Arc::new(MemoryStore::new()), Duration::from_secs(60)).build();
//!
//! let app = Router::new()
//!     .route("/api/pages/time", get(handler))
//!     .route_layer(middleware::from_fn_with_state(cache, cache_middleware));
//! ```

pub mod coalesce;
pub mod config;
pub mod encoding;
pub mod entry;
pub mod keys;
pub mod logger;
pub mod middleware;
pub mod pool;
pub mod recorder;
pub mod store;

pub use coalesce::{CoalesceError, CoalescingGroup};
pub use config::{CacheConfig, ConfigError, EncodingKind, KeyPolicy, StoreBackend};
pub use encoding::{Encoding, EncodingError, JsonEncoding, JsonGzipEncoding};
pub use entry::CacheEntry;
pub use keys::{KeyGenerator, RequestPath, RequestUri, key_with_prefix};
pub use logger::{Discard, Logger, RequestContext, TracingLogger};
pub use middleware::{
    Aborted, FillError, FillResult, ResponseCache, ResponseCacheBuilder, cache_middleware,
    random_jitter,
};
pub use pool::{EntryPool, PooledEntry};
pub use recorder::ResponseRecorder;
pub use store::{MemoryStore, RedisStore, Store, StoreError};
