//! HTTP request handlers for the fact-check API
//!
//! Provides handlers for:
//! - Health checks and index statistics
//! - Single and batch claim checking
//! - Evidence search

use std::sync::Arc;

use axum::{extract::State, Json};
use factcheck_core::corpus::SourceCount;
use factcheck_core::search::expand_query_terms;
use factcheck_core::{AggregatedResult, IndexStats, RetrievalCandidate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchCheckRequest {
    pub claims: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub candidates: Vec<RetrievalCandidate>,
    /// Advisory vocabulary hints; not used in ranking
    pub expansions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub index: IndexStats,
    pub uptime_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub count: usize,
    pub dimension: usize,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub sources: Vec<SourceCount>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now() - state.started_at;

    Json(HealthResponse {
        status: "ok".to_string(),
        index: state.checker.stats().await,
        uptime_seconds: uptime.num_seconds(),
    })
}

/// Index statistics with per-source document counts
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.checker.stats().await;
    let retrieval = &state.checker.config().retrieval;

    Json(StatsResponse {
        count: stats.count,
        dimension: stats.dimension,
        top_k: retrieval.top_k,
        similarity_threshold: retrieval.similarity_threshold,
        sources: state.checker.source_distribution().await,
    })
}

/// Check one input text
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<AggregatedResult>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::InvalidRequest("text must not be empty".to_string()));
    }

    info!("Check request: {} chars", request.text.len());
    let result = state.checker.check_claim(&request.text).await?;
    Ok(Json(result))
}

/// Check several texts; results follow input order
pub async fn check_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchCheckRequest>,
) -> Result<Json<Vec<AggregatedResult>>, ApiError> {
    info!("Batch check request: {} claims", request.claims.len());
    let results = state.checker.check_batch(&request.claims).await?;
    Ok(Json(results))
}

/// Evidence search under the threshold-with-fallback policy
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::InvalidRequest("query must not be empty".to_string()));
    }

    info!("Search: query='{}', top_k={:?}", request.query, request.top_k);
    let candidates = state.checker.search(&request.query, request.top_k).await?;

    Ok(Json(SearchResponse {
        expansions: expand_query_terms(&request.query),
        query: request.query,
        candidates,
    }))
}
