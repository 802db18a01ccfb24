use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use seekdex_core::{DocId, QueryEngine, SearchConfig, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upper bound for `k` accepted from clients.
pub const MAX_K: usize = 100;
/// Bytes of document text returned by `/doc/:doc_id`.
const DOC_TEXT_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Number of top documents used for pseudo-relevance feedback.
    #[serde(default)]
    pub prf: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

type ApiError = (StatusCode, String);

pub fn build_app(index_dir: &str, config: SearchConfig) -> Result<Router> {
    let engine = QueryEngine::open(index_dir, config)?;
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<QueryEngine>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.min(MAX_K);
    let engine = state.engine.clone();
    let query = params.q.clone();
    // index reads are blocking file I/O
    let results = tokio::task::spawn_blocking(move || engine.search(&query, k, params.prf))
        .await
        .map_err(internal)?
        .map_err(internal)?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine.clone();
    let doc = tokio::task::spawn_blocking(move || -> seekdex_core::Result<Option<serde_json::Value>> {
        let handler = engine.handler();
        let Some(title) = handler.title(doc_id) else { return Ok(None) };
        let text = handler.document_text(doc_id, DOC_TEXT_BYTES)?;
        Ok(Some(serde_json::json!({ "doc_id": doc_id, "title": title, "text": text })))
    })
    .await
    .map_err(internal)?
    .map_err(internal)?;

    doc.map(Json).ok_or((StatusCode::NOT_FOUND, "not found".into()))
}

fn internal<E: std::fmt::Display>(err: E) -> ApiError {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
