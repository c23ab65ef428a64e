use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderValue, StatusCode}, routing::get, Json, Router};
use lemmadex_core::{lemmatizer_for, CorpusPaths, DocId, RankedHit, SearchEngine, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Documents with a non-zero similarity, before truncation to `k`.
    pub total_hits: usize,
    pub results: Vec<RankedHit>,
}

#[derive(Deserialize)]
pub struct BooleanParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<DocId>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// Loads the corpus under `data_dir` and builds the router around it.
pub fn build_app<P: AsRef<Path>>(data_dir: P, stemmer: Option<&str>) -> Result<Router> {
    let paths = CorpusPaths::new(data_dir);
    let lemmatizer = lemmatizer_for(stemmer, &paths.lemmas)?;
    let engine = SearchEngine::open(&paths, lemmatizer)?;
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .with_state(AppState { engine })
        .layer(cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref()))
        .layer(TraceLayer::new_for_http())
}

/// Restricts origins to the comma-separated `allowed` list; any origin when
/// unset or when nothing in it parses.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<HeaderValue> = allowed
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let mut ranked = state.engine.ranker().search(&params.q, usize::MAX);
    let total_hits = ranked.iter().filter(|h| h.score > 0.0).count();
    ranked.truncate(k);
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "ranked query served");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results: ranked })
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<BooleanResponse>, (StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let results = state.engine.boolean_search(&params.q).map_err(|err| {
        tracing::debug!(query = %params.q, error = %err, "rejected boolean query");
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": err.to_string() })))
    })?;
    let elapsed = start.elapsed();
    Ok(Json(BooleanResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}
