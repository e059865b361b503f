//! Cache key generation.
//!
//! Provides consistent cache key generation from incoming requests.
//!
//! The built-in generators only key `GET` requests. Any other method
//! bypasses the cache, so a middleware layered over a whole route never
//! serves a stored `GET` page to a `POST`, or stores a `POST` response.

use axum::{
    extract::{OriginalUri, Request},
    http::Method,
};
use sha2::{Digest, Sha256};
use url::form_urlencoded;

/// Default prefix for page cache keys.
pub const DEFAULT_PREFIX: &str = "pagecache:page:";

/// Candidates longer than this are replaced by their digest.
const MAX_RAW_KEY_LEN: usize = 200;

/// Decides whether a request participates in caching and under which key.
///
/// Returning `None` bypasses the cache entirely: the handler runs, nothing is
/// read or written.
pub trait KeyGenerator: Send + Sync + 'static {
    fn generate_key(&self, req: &Request) -> Option<String>;
}

impl<F> KeyGenerator for F
where
    F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
{
    fn generate_key(&self, req: &Request) -> Option<String> {
        self(req)
    }
}

/// Builds a key from `prefix` and `candidate`.
///
/// Candidates over 200 bytes are replaced by the hex SHA-256 digest of the
/// candidate; the prefix is kept as-is in both forms.
pub fn key_with_prefix(prefix: &str, candidate: &str) -> String {
    if candidate.len() > MAX_RAW_KEY_LEN {
        let digest = Sha256::digest(candidate.as_bytes());
        format!("{}{}", prefix, hex::encode(digest))
    } else {
        format!("{}{}", prefix, candidate)
    }
}

fn escape(target: &str) -> String {
    form_urlencoded::byte_serialize(target.as_bytes()).collect()
}

/// The full request URI as the client sent it, even behind nested routers.
fn original_uri(req: &Request) -> &axum::http::Uri {
    req.extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri())
}

/// Keys on the escaped request target (path and query string).
///
/// This is the default policy.
#[derive(Debug, Clone)]
pub struct RequestUri {
    prefix: String,
}

impl RequestUri {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Derives the key for a raw request target such as `/a?b=c`.
    pub fn key_for(&self, target: &str) -> String {
        key_with_prefix(&self.prefix, &escape(target))
    }
}

impl Default for RequestUri {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeyGenerator for RequestUri {
    fn generate_key(&self, req: &Request) -> Option<String> {
        if req.method() != Method::GET {
            return None;
        }
        let uri = original_uri(req);
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        Some(self.key_for(target))
    }
}

/// Keys on the escaped request path only; requests differing just by query
/// string share one entry.
#[derive(Debug, Clone)]
pub struct RequestPath {
    prefix: String,
}

impl RequestPath {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Derives the key for a raw request target; the query string is ignored.
    pub fn key_for(&self, target: &str) -> String {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        key_with_prefix(&self.prefix, &escape(path))
    }
}

impl Default for RequestPath {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeyGenerator for RequestPath {
    fn generate_key(&self, req: &Request) -> Option<String> {
        if req.method() != Method::GET {
            return None;
        }
        Some(self.key_for(original_uri(req).path()))
    }
}
