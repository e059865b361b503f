use axum::{Router, middleware, routing::get};
use pagecache_observability::{PrometheusHandle, logging_middleware, metrics_app, metrics_middleware};

use crate::modules::pages::{controller::health, router::init_pages_router};
use crate::state::AppState;

pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/pages", init_pages_router(&state))
        .with_state(state);

    let app = match metrics {
        Some(handle) => app.merge(metrics_app(handle)),
        None => app,
    };

    app.layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
