//! In-process store.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::{task::JoinHandle, time::interval};
use tracing::debug;

use super::{Store, StoreError};

struct Item {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Item {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store with lazy expiry.
///
/// Expired items are dropped when read; [`MemoryStore::spawn_janitor`] sweeps
/// them periodically as well. With a capacity set, inserting into a full store
/// evicts the item closest to expiry.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<DashMap<String, Item>>,
    max_entries: Option<usize>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.items.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that holds at most `max_entries` items.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            items: Arc::new(DashMap::with_capacity(max_entries)),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Number of stored items, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a live item is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.items
            .get(key)
            .is_some_and(|item| !item.is_expired(Instant::now()))
    }

    /// Starts a background task removing expired items every `period`.
    pub fn spawn_janitor(&self, period: Duration) -> JoinHandle<()> {
        let items = Arc::clone(&self.items);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let before = items.len();
                items.retain(|_, item| !item.is_expired(now));
                let removed = before.saturating_sub(items.len());
                if removed > 0 {
                    debug!(cache.removed = removed, "Swept expired entries");
                }
            }
        })
    }

    fn evict_if_needed(&self, incoming: &str) {
        let Some(max) = self.max_entries else {
            return;
        };
        if self.items.len() < max || self.items.contains_key(incoming) {
            return;
        }

        let now = Instant::now();
        self.items.retain(|_, item| !item.is_expired(now));
        if self.items.len() < max {
            return;
        }

        // Never-expiring items sort last.
        let victim = self
            .items
            .iter()
            .min_by_key(|item| (item.expires_at.is_none(), item.expires_at))
            .map(|item| item.key().clone());
        if let Some(key) = victim {
            self.items.remove(&key);
            debug!(cache.key = %key, "Evicted entry at capacity");
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let now = Instant::now();
        if let Some(item) = self.items.get(key) {
            if !item.is_expired(now) {
                return Ok(item.value.clone());
            }
        }
        self.items.remove_if(key, |_, item| item.is_expired(now));
        Err(StoreError::Miss)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.evict_if_needed(key);

        // A TTL past the clock's range never expires.
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        self.items.insert(
            key.to_owned(),
            Item {
                value: Bytes::copy_from_slice(value),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}
