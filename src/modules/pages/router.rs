use axum::{Router, middleware, routing::get};
use pagecache::cache_middleware;

use crate::state::AppState;

use super::controller::{missing_page, private_page, slow_page, stats, time_page};

/// Page routes. Everything except `/stats` goes through the response cache.
pub fn init_pages_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/time", get(time_page))
        .route("/slow", get(slow_page))
        .route("/missing", get(missing_page))
        .route("/private", get(private_page))
        .route_layer(middleware::from_fn_with_state(
            state.cache.clone(),
            cache_middleware,
        ))
        .route("/stats", get(stats))
}
