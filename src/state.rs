use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use anyhow::Context;
use pagecache::{
    CacheConfig, ResponseCache, ResponseCacheBuilder, Store, StoreBackend, TracingLogger,
};
use tracing::info;

#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: ResponseCache,
    pub cache_config: CacheConfig,
    renders: Arc<AtomicU64>,
}

impl AppState {
    /// State over an already opened store.
    pub fn new(cache_config: CacheConfig, store: Arc<dyn Store>) -> Self {
        let cache = ResponseCacheBuilder::from_config(&cache_config, store)
            .logger(TracingLogger)
            .build();

        Self {
            cache,
            cache_config,
            renders: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counts a page render and returns its sequence number.
    pub fn record_render(&self) -> u64 {
        self.renders.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }
}

/// Opens the configured store and builds the application state.
pub async fn init_app_state(cache_config: CacheConfig) -> anyhow::Result<AppState> {
    let store = open_store(&cache_config).await?;
    Ok(AppState::new(cache_config, store))
}

/// Opens the configured store.
pub async fn open_store(cache_config: &CacheConfig) -> anyhow::Result<Arc<dyn Store>> {
    let store = cache_config
        .connect_store()
        .await
        .context("Failed to open cache store")?;

    info!(
        backend = ?cache_config.backend,
        ttl_seconds = cache_config.ttl_seconds,
        key_policy = ?cache_config.key_policy,
        encoding = ?cache_config.encoding,
        "Cache store ready"
    );

    Ok(store)
}

/// Removes the cached page for a request target and returns its key.
///
/// Only shared backends can be purged from outside the server: a memory
/// cache lives inside the serving process.
pub async fn purge_page(cache_config: &CacheConfig, target: &str) -> anyhow::Result<String> {
    if cache_config.backend == StoreBackend::Memory {
        anyhow::bail!(
            "purge needs a shared cache backend; the memory cache lives inside the server process (set CACHE_BACKEND=redis)"
        );
    }

    let key = cache_config.key_for(target);
    let store = open_store(cache_config).await?;
    store
        .delete(&key)
        .await
        .with_context(|| format!("Failed to purge {}", key))?;

    Ok(key)
}
