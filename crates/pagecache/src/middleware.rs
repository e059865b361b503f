//! Response caching middleware.
//!
//! Per request the middleware derives a key, serves a stored entry when one
//! decodes, and otherwise runs the handler once per key across concurrent
//! requests. The executing request streams the handler's response straight
//! to its client while recording it; requests that joined the in-flight fill
//! replay the recorded entry. Successful responses are committed to the
//! store after the body ends.
//!
//! Caching faults (store errors, undecodable entries, even panics inside a
//! store or encoding) never replace the real response. They are reported to
//! the configured [`Logger`] and counted.
//!
//! # Example
//!
//! ```ignore
//! use std::{sync::Arc, time::Duration};
//! use axum::{Router, middleware, routing::get};
//! use pagecache::{MemoryStore, ResponseCache, TracingLogger, cache_middleware, random_jitter};
//!
//! let cache = ResponseCache::builder(Arc::new(MemoryStore::new()), Duration::from_secs(60))
//!     .jitter(random_jitter(Duration::from_secs(5)))
//!     .logger(TracingLogger)
//!     .build();
//!
//! let app = Router::new()
//!     .route("/api/pages/time", get(handler))
//!     .route_layer(middleware::from_fn_with_state(cache, cache_middleware));
//! ```

use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    pin::pin,
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use http_body::Body as _;
use http_body_util::BodyExt;
use metrics::counter;
use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, error, instrument, warn};

use crate::{
    coalesce::{CoalesceError, CoalescingGroup},
    config::CacheConfig,
    encoding::{Encoding, JsonEncoding},
    entry::CacheEntry,
    keys::{KeyGenerator, RequestUri},
    logger::{Discard, Logger, RequestContext},
    pool::EntryPool,
    recorder::{ChannelBody, ResponseRecorder},
    store::{Store, StoreError},
};

/// Frames buffered between the fill and a slow client.
const FORWARD_BUFFER: usize = 16;

/// Response extension marking a response as not cacheable.
///
/// ```ignore
/// async fn handler() -> impl IntoResponse {
///     (Extension(Aborted), "for this client only")
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Aborted;

/// Why a fill produced no entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillError {
    #[error("response body failed: {0}")]
    Body(String),
}

/// What an in-flight fill publishes to the requests waiting on it.
pub type FillResult = Result<Arc<CacheEntry>, FillError>;

type Jitter = dyn Fn() -> Duration + Send + Sync;

/// Returns a jitter function drawing uniformly from `[0, max]` at
/// millisecond resolution.
pub fn random_jitter(max: Duration) -> impl Fn() -> Duration + Send + Sync + Clone + 'static {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    move || {
        if max_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
        }
    }
}

struct Inner {
    store: Arc<dyn Store>,
    ttl: Duration,
    jitter: Option<Arc<Jitter>>,
    key_generator: Arc<dyn KeyGenerator>,
    group: CoalescingGroup<FillResult>,
    logger: Arc<dyn Logger>,
    encoding: Arc<dyn Encoding>,
    pool: Arc<EntryPool>,
}

/// The caching middleware state. Cheap to clone.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.inner.ttl)
            .field("group", &self.inner.group)
            .finish_non_exhaustive()
    }
}

pub struct ResponseCacheBuilder {
    store: Arc<dyn Store>,
    ttl: Duration,
    jitter: Option<Arc<Jitter>>,
    key_generator: Option<Arc<dyn KeyGenerator>>,
    group: Option<CoalescingGroup<FillResult>>,
    logger: Option<Arc<dyn Logger>>,
    encoding: Option<Arc<dyn Encoding>>,
    pool: Option<Arc<EntryPool>>,
}

impl ResponseCacheBuilder {
    /// Starts from the settings in `config`: TTL, jitter bound, key policy
    /// and encoding. The store is opened separately, see
    /// [`CacheConfig::connect_store`].
    pub fn from_config(config: &CacheConfig, store: Arc<dyn Store>) -> Self {
        let mut builder = ResponseCache::builder(store, config.ttl());
        if !config.max_jitter().is_zero() {
            builder = builder.jitter(random_jitter(config.max_jitter()));
        }
        builder.key_generator = Some(config.key_generator());
        builder.encoding = Some(config.encoding());
        builder
    }

    /// Extra TTL drawn per stored entry. Not applied when the TTL is zero.
    pub fn jitter<F>(mut self, jitter: F) -> Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        self.jitter = Some(Arc::new(jitter));
        self
    }

    pub fn key_generator<K: KeyGenerator>(mut self, key_generator: K) -> Self {
        self.key_generator = Some(Arc::new(key_generator));
        self
    }

    /// Shares a coalescing group with other caches.
    pub fn coalescing_group(mut self, group: CoalescingGroup<FillResult>) -> Self {
        self.group = Some(group);
        self
    }

    pub fn logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn encoding<E: Encoding + 'static>(mut self, encoding: E) -> Self {
        self.encoding = Some(Arc::new(encoding));
        self
    }

    pub fn entry_pool(mut self, pool: Arc<EntryPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> ResponseCache {
        ResponseCache {
            inner: Arc::new(Inner {
                store: self.store,
                ttl: self.ttl,
                jitter: self.jitter,
                key_generator: self
                    .key_generator
                    .unwrap_or_else(|| Arc::new(RequestUri::default())),
                group: self.group.unwrap_or_default(),
                logger: self.logger.unwrap_or_else(|| Arc::new(Discard)),
                encoding: self.encoding.unwrap_or_else(|| Arc::new(JsonEncoding)),
                pool: self.pool.unwrap_or_default(),
            }),
        }
    }
}

/// Axum middleware entry point, for use with
/// [`axum::middleware::from_fn_with_state`].
///
/// A layer covers every method of the routes under it. The default key
/// generators key only `GET` requests; a custom [`KeyGenerator`] that keys
/// other methods shares entries across them.
pub async fn cache_middleware(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    cache.handle(request, next).await
}

impl ResponseCache {
    /// Caches responses in `store` for `ttl`; a zero TTL never expires.
    pub fn builder(store: Arc<dyn Store>, ttl: Duration) -> ResponseCacheBuilder {
        ResponseCacheBuilder {
            store,
            ttl,
            jitter: None,
            key_generator: None,
            group: None,
            logger: None,
            encoding: None,
            pool: None,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn coalescing_group(&self) -> &CoalescingGroup<FillResult> {
        &self.inner.group
    }

    /// Serves `request` from the cache or through `next`.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let Some(key) = self.inner.key_generator.generate_key(&request) else {
            return next.run(request).await;
        };

        let ctx = RequestContext {
            method: request.method().clone(),
            uri: request.uri().clone(),
            key,
        };

        if let Some(response) = self.lookup(&ctx).await {
            return response;
        }

        self.fill(ctx, request, next).await
    }

    /// TTL for an entry being stored now.
    fn expiry(&self) -> Duration {
        match &self.inner.jitter {
            Some(jitter) if !self.inner.ttl.is_zero() => self.inner.ttl.saturating_add(jitter()),
            _ => self.inner.ttl,
        }
    }

    fn report(&self, ctx: &RequestContext, args: fmt::Arguments<'_>) {
        warn!(cache.key = %ctx.key, "{}", args);
        self.inner.logger.error(ctx, args);
    }

    async fn lookup(&self, ctx: &RequestContext) -> Option<Response> {
        let fetched = AssertUnwindSafe(self.inner.store.get(&ctx.key))
            .catch_unwind()
            .await;

        let data = match fetched {
            Ok(Ok(data)) => data,
            Ok(Err(StoreError::Miss)) => {
                counter!("pagecache_lookups_total", "result" => "miss").increment(1);
                return None;
            }
            Ok(Err(e)) => {
                counter!("pagecache_lookups_total", "result" => "error").increment(1);
                counter!("pagecache_store_errors_total", "operation" => "get").increment(1);
                self.report(ctx, format_args!("cache get failed: {}", e));
                return None;
            }
            Err(_) => {
                counter!("pagecache_lookups_total", "result" => "error").increment(1);
                counter!("pagecache_store_errors_total", "operation" => "get").increment(1);
                self.report(ctx, format_args!("cache get panicked"));
                return None;
            }
        };

        let mut entry = self.inner.pool.get();
        let decoded = catch_unwind(AssertUnwindSafe(|| {
            self.inner.encoding.unmarshal_into(&data, &mut entry)
        }));

        match decoded {
            Ok(Ok(())) => {
                counter!("pagecache_lookups_total", "result" => "hit").increment(1);
                debug!(cache.key = %ctx.key, "Cache hit");
                Some(entry.to_response())
            }
            Ok(Err(e)) => {
                counter!("pagecache_lookups_total", "result" => "error").increment(1);
                counter!("pagecache_encoding_errors_total").increment(1);
                self.report(ctx, format_args!("cache entry decode failed: {}", e));
                None
            }
            Err(_) => {
                counter!("pagecache_lookups_total", "result" => "error").increment(1);
                counter!("pagecache_encoding_errors_total").increment(1);
                self.report(ctx, format_args!("cache entry decode panicked"));
                None
            }
        }
    }

    async fn fill(&self, ctx: RequestContext, request: Request, next: Next) -> Response {
        let (head_tx, mut head_rx) = oneshot::channel();

        let cache = self.clone();
        let fill_ctx = ctx.clone();
        let mut flight = pin!(self.inner.group.work(&ctx.key, move || {
            cache.execute(fill_ctx, request, next, head_tx)
        }));

        // The executor gets the live response head; everyone else, including
        // an executor whose fill died before producing a head, gets the
        // published outcome.
        tokio::select! {
            biased;
            Ok(response) = &mut head_rx => response,
            outcome = &mut flight => self.replay(&ctx, outcome),
        }
    }

    fn replay(
        &self,
        ctx: &RequestContext,
        outcome: Result<(FillResult, bool), CoalesceError>,
    ) -> Response {
        match outcome {
            Ok((Ok(entry), executed)) => {
                if !executed {
                    counter!("pagecache_coalesced_total").increment(1);
                    debug!(cache.key = %ctx.key, "Replaying shared fill");
                }
                entry.to_response()
            }
            Ok((Err(e), _)) => {
                warn!(cache.key = %ctx.key, error = %e, "Shared fill failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Err(e) => {
                error!(cache.key = %ctx.key, error = %e, "Shared fill abandoned");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    /// Runs the handler, streams its response to the executing client and
    /// records it. Runs detached from any request.
    #[instrument(skip_all, fields(cache.key = %ctx.key))]
    async fn execute(
        self,
        ctx: RequestContext,
        request: Request,
        next: Next,
        head_tx: oneshot::Sender<Response>,
    ) -> FillResult {
        let response = next.run(request).await;
        let aborted = response.extensions().get::<Aborted>().is_some();
        let (parts, body) = response.into_parts();

        let mut recorder = ResponseRecorder::new(&parts, body);
        let (frame_tx, client_body) = ChannelBody::channel(FORWARD_BUFFER, recorder.size_hint());
        let mut client = head_tx
            .send(Response::from_parts(parts, Body::new(client_body)))
            .ok()
            .map(|()| frame_tx);

        while let Some(frame) = recorder.frame().await {
            match frame {
                Ok(frame) => {
                    let gone = match &client {
                        Some(tx) => tx.send(Ok(frame)).await.is_err(),
                        None => false,
                    };
                    if gone {
                        debug!("Client went away, recording without forwarding");
                        client = None;
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    if let Some(tx) = client.take() {
                        let _ = tx.send(Err(e)).await;
                    }
                    counter!("pagecache_fills_total", "outcome" => "failed").increment(1);
                    warn!(error = %message, "Response body failed, not caching");
                    return Err(FillError::Body(message));
                }
            }
        }

        let entry = Arc::new(recorder.into_entry());
        if aborted || !entry.is_success() {
            counter!("pagecache_fills_total", "outcome" => "skipped").increment(1);
            debug!(status = entry.status, aborted, "Response not cacheable");
            return Ok(entry);
        }

        self.commit(&ctx, &entry).await;
        // The client's body ends only once the entry is stored.
        drop(client);
        Ok(entry)
    }

    async fn commit(&self, ctx: &RequestContext, entry: &CacheEntry) {
        let encoded = match catch_unwind(AssertUnwindSafe(|| self.inner.encoding.marshal(entry))) {
            Ok(Ok(encoded)) => encoded,
            Ok(Err(e)) => {
                counter!("pagecache_encoding_errors_total").increment(1);
                counter!("pagecache_fills_total", "outcome" => "failed").increment(1);
                self.report(ctx, format_args!("cache entry encode failed: {}", e));
                return;
            }
            Err(_) => {
                counter!("pagecache_encoding_errors_total").increment(1);
                counter!("pagecache_fills_total", "outcome" => "failed").increment(1);
                self.report(ctx, format_args!("cache entry encode panicked"));
                return;
            }
        };

        let ttl = self.expiry();
        let stored = AssertUnwindSafe(self.inner.store.set(&ctx.key, &encoded, ttl))
            .catch_unwind()
            .await;

        match stored {
            Ok(Ok(())) => {
                counter!("pagecache_fills_total", "outcome" => "stored").increment(1);
                debug!(cache.ttl_ms = %ttl.as_millis(), "Cache filled");
            }
            Ok(Err(e)) => {
                counter!("pagecache_fills_total", "outcome" => "failed").increment(1);
                counter!("pagecache_store_errors_total", "operation" => "set").increment(1);
                self.report(ctx, format_args!("cache set failed: {}", e));
            }
            Err(_) => {
                counter!("pagecache_fills_total", "outcome" => "failed").increment(1);
                counter!("pagecache_store_errors_total", "operation" => "set").increment(1);
                self.report(ctx, format_args!("cache set panicked"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use axum::{Extension, Router, middleware, routing::get};
    use bytes::Bytes;
    use futures::stream;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Logger for Arc<Collect> {
        fn error(&self, ctx: &RequestContext, args: fmt::Arguments<'_>) {
            self.0.lock().push(format!("{}: {}", ctx.key, args));
        }
    }

    /// Records the TTL of every set.
    #[derive(Default)]
    struct TtlStore {
        inner: MemoryStore,
        ttls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Store for TtlStore {
        async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
            self.ttls.lock().push(ttl);
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }

    struct PanickingStore;

    #[async_trait]
    impl Store for PanickingStore {
        async fn get(&self, _key: &str) -> Result<Bytes, StoreError> {
            panic!("get exploded")
        }

        async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), StoreError> {
            panic!("set exploded")
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn counting_app(cache: ResponseCache, hits: Arc<AtomicUsize>) -> Router {
        let private_hits = Arc::clone(&hits);
        Router::new()
            .route(
                "/page",
                get(move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst);
                        format!("render {}", n)
                    }
                }),
            )
            .route(
                "/private",
                get(move || {
                    let hits = Arc::clone(&private_hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        (Extension(Aborted), "private")
                    }
                }),
            )
            .route(
                "/broken",
                get(|| async {
                    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                        Ok(Bytes::from_static(b"partial")),
                        Err(std::io::Error::other("upstream reset")),
                    ];
                    Body::from_stream(stream::iter(chunks))
                }),
            )
            .layer(middleware::from_fn_with_state(cache, cache_middleware))
    }

    async fn get_body(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_store() {
        let store = Arc::new(MemoryStore::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(60)).build();
        let app = counting_app(cache, Arc::clone(&hits));

        let first = get_body(&app, "/page").await;
        let second = get_body(&app, "/page").await;

        assert_eq!(first, (StatusCode::OK, "render 0".to_string()));
        assert_eq!(second, first);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(store.contains("pagecache:page:%2Fpage"));
    }

    #[tokio::test]
    async fn test_bypass_when_no_key() {
        let store = Arc::new(MemoryStore::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(60))
            .key_generator(|_: &Request| -> Option<String> { None })
            .build();
        let app = counting_app(cache, Arc::clone(&hits));

        assert_eq!(get_body(&app, "/page").await.1, "render 0");
        assert_eq!(get_body(&app, "/page").await.1, "render 1");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_aborted_response_is_not_stored() {
        let store = Arc::new(MemoryStore::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(60)).build();
        let app = counting_app(cache, Arc::clone(&hits));

        assert_eq!(get_body(&app, "/private").await, (StatusCode::OK, "private".into()));
        assert_eq!(get_body(&app, "/private").await.1, "private");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_body_error_reaches_client_and_is_not_stored() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(60)).build();
        let app = counting_app(cache, Arc::new(AtomicUsize::new(0)));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.into_body().collect().await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_jitter_extends_ttl() {
        let store = Arc::new(TtlStore::default());
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(10))
            .jitter(|| Duration::from_secs(2))
            .build();
        let app = counting_app(cache, Arc::new(AtomicUsize::new(0)));

        get_body(&app, "/page").await;

        assert_eq!(store.ttls.lock().as_slice(), [Duration::from_secs(12)]);
    }

    #[tokio::test]
    async fn test_jitter_not_applied_without_expiry() {
        let store = Arc::new(TtlStore::default());
        let cache = ResponseCache::builder(store.clone(), Duration::ZERO)
            .jitter(|| Duration::from_secs(2))
            .build();
        let app = counting_app(cache, Arc::new(AtomicUsize::new(0)));

        get_body(&app, "/page").await;

        assert_eq!(store.ttls.lock().as_slice(), [Duration::ZERO]);
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_and_is_still_cached() {
        let max = Duration::from_secs(u64::MAX);
        for jitter in [None, Some(Duration::from_secs(1))] {
            let store = Arc::new(TtlStore::default());
            let logs = Arc::new(Collect::default());
            let hits = Arc::new(AtomicUsize::new(0));
            let mut builder = ResponseCache::builder(store.clone(), max).logger(Arc::clone(&logs));
            if let Some(jitter) = jitter {
                builder = builder.jitter(move || jitter);
            }
            let app = counting_app(builder.build(), Arc::clone(&hits));

            assert_eq!(get_body(&app, "/page").await.1, "render 0");
            assert_eq!(get_body(&app, "/page").await.1, "render 0");

            assert_eq!(hits.load(Ordering::SeqCst), 1);
            assert!(store.inner.contains("pagecache:page:%2Fpage"));
            let expected = max.saturating_add(jitter.unwrap_or_default());
            assert_eq!(store.ttls.lock().as_slice(), [expected]);
            assert!(logs.0.lock().is_empty());
        }
    }

    #[test]
    fn test_random_jitter_bounds() {
        let zero = random_jitter(Duration::ZERO);
        assert_eq!(zero(), Duration::ZERO);

        let jitter = random_jitter(Duration::from_millis(50));
        for _ in 0..100 {
            assert!(jitter() <= Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss_and_gets_replaced() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("pagecache:page:%2Fpage", b"not json", Duration::ZERO)
            .await
            .unwrap();
        let logs = Arc::new(Collect::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = ResponseCache::builder(store.clone(), Duration::from_secs(60))
            .logger(Arc::clone(&logs))
            .build();
        let app = counting_app(cache, Arc::clone(&hits));

        assert_eq!(get_body(&app, "/page").await.1, "render 0");
        assert_eq!(get_body(&app, "/page").await.1, "render 0");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let logs = logs.0.lock();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].starts_with("pagecache:page:%2Fpage: cache entry decode failed"));
    }

    #[tokio::test]
    async fn test_panicking_store_never_breaks_the_response() {
        let logs = Arc::new(Collect::default());
        let cache = ResponseCache::builder(Arc::new(PanickingStore), Duration::from_secs(60))
            .logger(Arc::clone(&logs))
            .build();
        let app = counting_app(cache, Arc::new(AtomicUsize::new(0)));

        assert_eq!(get_body(&app, "/page").await, (StatusCode::OK, "render 0".into()));

        let logs = logs.0.lock();
        assert!(logs.iter().any(|line| line.ends_with("cache get panicked")));
        assert!(logs.iter().any(|line| line.ends_with("cache set panicked")));
    }

    #[tokio::test]
    async fn test_from_config_uses_policy_and_encoding() {
        let config = CacheConfig {
            key_policy: crate::config::KeyPolicy::Path,
            encoding: crate::config::EncodingKind::Gzip,
            key_prefix: "site:".into(),
            ..CacheConfig::default()
        };
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCacheBuilder::from_config(&config, store.clone()).build();
        let app = counting_app(cache, Arc::new(AtomicUsize::new(0)));

        get_body(&app, "/page?a=1").await;
        assert_eq!(get_body(&app, "/page?a=2").await.1, "render 0");

        let raw = store.get("site:%2Fpage").await.unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }
}
