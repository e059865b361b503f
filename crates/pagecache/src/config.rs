//! Cache configuration.
//!
//! This module provides the response cache settings loaded from
//! environment variables.

use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    encoding::{Encoding, JsonEncoding, JsonGzipEncoding},
    keys::{DEFAULT_PREFIX, KeyGenerator, RequestPath, RequestUri},
    store::{MemoryStore, RedisStore, Store, StoreError},
};

/// How often a memory backend sweeps expired entries.
const JANITOR_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: expected one of {expected}")]
    InvalidChoice {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid number {value:?} for {var}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Where encoded entries live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            _ => Err(ConfigError::InvalidChoice {
                var: "CACHE_BACKEND",
                value: s.to_owned(),
                expected: "memory, redis",
            }),
        }
    }
}

/// Which part of the request target the key is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Path and query string.
    #[default]
    Uri,
    /// Path only.
    Path,
}

impl FromStr for KeyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uri" => Ok(Self::Uri),
            "path" => Ok(Self::Path),
            _ => Err(ConfigError::InvalidChoice {
                var: "CACHE_KEY_POLICY",
                value: s.to_owned(),
                expected: "uri, path",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodingKind {
    #[default]
    Json,
    Gzip,
}

impl FromStr for EncodingKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "gzip" => Ok(Self::Gzip),
            _ => Err(ConfigError::InvalidChoice {
                var: "CACHE_ENCODING",
                value: s.to_owned(),
                expected: "json, gzip",
            }),
        }
    }
}

/// Response cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `CACHE_BACKEND`: `memory` or `redis` (default: `memory`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: TTL for cached pages in seconds, `0` never expires (default: `300`)
/// - `CACHE_JITTER_MS`: Upper bound of the random extra TTL (default: `0`)
/// - `CACHE_PREFIX`: Prefix for all cache keys (default: `pagecache:page:`)
/// - `CACHE_KEY_POLICY`: `uri` or `path` (default: `uri`)
/// - `CACHE_ENCODING`: `json` or `gzip` (default: `json`)
/// - `CACHE_MAX_ENTRIES`: Capacity of the memory backend (default: unbounded)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: StoreBackend,

    /// Redis connection URL.
    pub redis_url: String,

    /// Time-to-live for cached pages in seconds.
    pub ttl_seconds: u64,

    /// Maximum random jitter added to the TTL, in milliseconds.
    pub jitter_ms: u64,

    /// Prefix for all cache keys to avoid collisions.
    pub key_prefix: String,

    pub key_policy: KeyPolicy,

    pub encoding: EncodingKind,

    /// Capacity of the memory backend.
    pub max_entries: Option<usize>,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults; set but invalid ones
    /// are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            backend: parse_or(&lookup, "CACHE_BACKEND", defaults.backend)?,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            ttl_seconds: number_or(&lookup, "CACHE_TTL_SECONDS", defaults.ttl_seconds)?,
            jitter_ms: number_or(&lookup, "CACHE_JITTER_MS", defaults.jitter_ms)?,
            key_prefix: lookup("CACHE_PREFIX").unwrap_or(defaults.key_prefix),
            key_policy: parse_or(&lookup, "CACHE_KEY_POLICY", defaults.key_policy)?,
            encoding: parse_or(&lookup, "CACHE_ENCODING", defaults.encoding)?,
            max_entries: match lookup("CACHE_MAX_ENTRIES") {
                Some(value) => Some(parse_number("CACHE_MAX_ENTRIES", &value)?),
                None => None,
            },
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    /// The key generator selected by `key_policy`.
    pub fn key_generator(&self) -> Arc<dyn KeyGenerator> {
        match self.key_policy {
            KeyPolicy::Uri => Arc::new(RequestUri::new(self.key_prefix.clone())),
            KeyPolicy::Path => Arc::new(RequestPath::new(self.key_prefix.clone())),
        }
    }

    /// Derives the cache key for a raw request target such as `/a?b=c`.
    pub fn key_for(&self, target: &str) -> String {
        match self.key_policy {
            KeyPolicy::Uri => RequestUri::new(self.key_prefix.clone()).key_for(target),
            KeyPolicy::Path => RequestPath::new(self.key_prefix.clone()).key_for(target),
        }
    }

    pub fn encoding(&self) -> Arc<dyn Encoding> {
        match self.encoding {
            EncodingKind::Json => Arc::new(JsonEncoding),
            EncodingKind::Gzip => Arc::new(JsonGzipEncoding),
        }
    }

    /// Opens the configured backend. A memory backend gets a janitor task
    /// sweeping expired entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Redis` if the Redis connection fails.
    pub async fn connect_store(&self) -> Result<Arc<dyn Store>, StoreError> {
        match self.backend {
            StoreBackend::Memory => {
                let store = self
                    .max_entries
                    .map_or_else(MemoryStore::new, MemoryStore::with_capacity);
                store.spawn_janitor(JANITOR_PERIOD);
                Ok(Arc::new(store))
            }
            StoreBackend::Redis => Ok(Arc::new(RedisStore::connect(&self.redis_url).await?)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".into(),
            ttl_seconds: 300,
            jitter_ms: 0,
            key_prefix: DEFAULT_PREFIX.into(),
            key_policy: KeyPolicy::Uri,
            encoding: EncodingKind::Json,
            max_entries: None,
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = ConfigError>,
{
    lookup(var).map_or(Ok(default), |value| value.parse())
}

fn number_or<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).map_or(Ok(default), |value| parse_number(var, &value))
}

fn parse_number<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_owned(),
        })
}
