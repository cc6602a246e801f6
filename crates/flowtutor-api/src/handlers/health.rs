//! `GET /health`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.clustering.cache();
    let stats = cache.stats();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache_entries": cache.len().await,
        "cache": {
            "hits": stats.hits,
            "misses": stats.misses,
            "inserts": stats.inserts,
            "evictions": stats.evictions,
        },
    }))
}
