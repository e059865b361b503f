//! Free list of reusable cache entries.
//!
//! Hits decode into pooled entries so the body buffer is reused across
//! requests instead of reallocated for every replay.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::entry::CacheEntry;

const DEFAULT_MAX_IDLE: usize = 64;

/// Bodies with more capacity than this are dropped instead of pooled.
const DEFAULT_MAX_RETAINED_BODY: usize = 1024 * 1024;

#[derive(Debug)]
pub struct EntryPool {
    free: Mutex<Vec<CacheEntry>>,
    max_idle: usize,
    max_retained_body: usize,
}

impl Default for EntryPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

impl EntryPool {
    /// Creates a pool keeping at most `max_idle` entries around.
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            max_retained_body: DEFAULT_MAX_RETAINED_BODY,
        }
    }

    /// Caps the body capacity an idle entry may keep.
    pub fn with_max_retained_body(mut self, bytes: usize) -> Self {
        self.max_retained_body = bytes;
        self
    }

    /// Takes a cleared entry from the pool, allocating one if it is empty.
    pub fn get(self: &Arc<Self>) -> PooledEntry {
        let entry = self.free.lock().pop().unwrap_or_default();
        PooledEntry {
            entry: Some(entry),
            pool: Arc::clone(self),
        }
    }

    /// Number of idle entries.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn put(&self, mut entry: CacheEntry) {
        entry.reset();
        if entry.body.capacity() > self.max_retained_body {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(entry);
        }
    }
}

/// An entry borrowed from an [`EntryPool`]; returned on drop.
#[derive(Debug)]
pub struct PooledEntry {
    entry: Option<CacheEntry>,
    pool: Arc<EntryPool>,
}

impl Deref for PooledEntry {
    type Target = CacheEntry;

    fn deref(&self) -> &CacheEntry {
        self.entry.as_ref().expect("pooled entry present until drop")
    }
}

impl DerefMut for PooledEntry {
    fn deref_mut(&mut self) -> &mut CacheEntry {
        self.entry.as_mut().expect("pooled entry present until drop")
    }
}

impl Drop for PooledEntry {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.put(entry);
        }
    }
}
