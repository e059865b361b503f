//! Duplicate call suppression.
//!
//! Concurrent callers asking for the same key share one execution. The
//! first caller's function runs as its own task so dropping any caller,
//! including the first, never cancels the work others are waiting on.

use std::{future::Future, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoalesceError {
    /// The task computing the value died without publishing one.
    #[error("in-flight call abandoned before producing a value")]
    Abandoned,
}

type Slot<T> = watch::Receiver<Option<T>>;

/// A group of in-flight calls keyed by string.
///
/// Cloning yields a handle to the same group.
pub struct CoalescingGroup<T> {
    calls: Arc<DashMap<String, Slot<T>>>,
}

impl<T> Clone for CoalescingGroup<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for CoalescingGroup<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(DashMap::new()),
        }
    }
}

impl<T> std::fmt::Debug for CoalescingGroup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingGroup")
            .field("in_flight", &self.calls.len())
            .finish()
    }
}

impl<T> CoalescingGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    /// Whether a call for `key` is in flight.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.calls.contains_key(key)
    }

    /// Runs `f` unless a call for `key` is already in flight, and returns
    /// the value it produces.
    ///
    /// The flag is `true` only for the caller whose `f` ran. Every caller
    /// that joined before the value was published receives a clone of the
    /// same value. If `f` panics, all of them get [`CoalesceError::Abandoned`].
    pub async fn work<F, Fut>(&self, key: &str, f: F) -> Result<(T, bool), CoalesceError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (mut rx, publisher) = match self.calls.entry(key.to_owned()) {
            Entry::Occupied(call) => (call.get().clone(), None),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx.clone());
                (rx, Some(tx))
            }
        };

        let executed = publisher.is_some();
        match publisher {
            Some(tx) => {
                let guard = InFlight {
                    calls: Arc::clone(&self.calls),
                    key: key.to_owned(),
                    rx: rx.clone(),
                };
                tokio::spawn(async move {
                    let _guard = guard;
                    let value = f().await;
                    tx.send_replace(Some(value));
                });
            }
            None => {
                drop(f);
                debug!(cache.key = %key, "Joined in-flight call");
            }
        }

        match rx.wait_for(Option::is_some).await {
            Ok(value) => value
                .clone()
                .map(|value| (value, executed))
                .ok_or(CoalesceError::Abandoned),
            Err(_) => Err(CoalesceError::Abandoned),
        }
    }
}

/// Removes the key once the call task finishes or unwinds.
struct InFlight<T> {
    calls: Arc<DashMap<String, Slot<T>>>,
    key: String,
    rx: Slot<T>,
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        // A newer call may already own the key.
        self.calls
            .remove_if(&self.key, |_, current| current.same_channel(&self.rx));
    }
}
