//! Raw retrieval endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Nearest chunks for a question, without generation
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    if request.question.trim().is_empty() {
        return Err(Error::InvalidRequest("question cannot be empty".to_string()));
    }

    tracing::info!("Query: \"{}\" (top_k {})", request.question, request.top_k);
    let results = state.pipeline().query(&request.question, request.top_k).await?;

    Ok(Json(QueryResponse {
        question: request.question,
        results,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
