use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Extension, Json,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
};
use pagecache::Aborted;
use serde_json::json;

use crate::state::AppState;

use super::model::{Page, PageStats};

/// Simulated rendering cost of the slow page.
const SLOW_RENDER: Duration = Duration::from_millis(200);

fn render(state: &AppState, uri: &OriginalUri) -> Page {
    let rendered_at_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    Page {
        path: uri.0.to_string(),
        render: state.record_render(),
        rendered_at_nanos,
    }
}

pub async fn time_page(State(state): State<AppState>, uri: OriginalUri) -> Json<Page> {
    Json(render(&state, &uri))
}

pub async fn slow_page(State(state): State<AppState>, uri: OriginalUri) -> Json<Page> {
    tokio::time::sleep(SLOW_RENDER).await;
    Json(render(&state, &uri))
}

pub async fn missing_page(State(state): State<AppState>, uri: OriginalUri) -> impl IntoResponse {
    let page = render(&state, &uri);
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "page not found", "path": page.path, "render": page.render })),
    )
}

/// Per-client content; marked so it is never shared through the cache.
pub async fn private_page(State(state): State<AppState>, uri: OriginalUri) -> impl IntoResponse {
    (Extension(Aborted), Json(render(&state, &uri)))
}

pub async fn stats(State(state): State<AppState>) -> Json<PageStats> {
    Json(PageStats {
        renders: state.renders(),
        in_flight: state.cache.coalescing_group().in_flight(),
    })
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
