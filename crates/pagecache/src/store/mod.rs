//! Storage backends for encoded cache entries.
//!
//! Provides both in-memory and Redis backends behind one interface; callers
//! never branch on backend identity.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is absent or expired. Not a failure: compute and populate.
    #[error("Cache miss")]
    Miss,

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_miss(&self) -> bool {
        matches!(self, StoreError::Miss)
    }
}

/// Key/value persistence with TTL.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetches the value stored under `key`, or [`StoreError::Miss`].
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// A zero `ttl` means the value never expires.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`. Succeeds when the key is absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
