//! API routes for the Q&A server

pub mod chat;
pub mod query;
pub mod sessions;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for files
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Chat
        .route("/chat", post(chat::chat))
        .route("/clear", post(chat::clear))
        // Sessions
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:id", axum::routing::delete(sessions::delete_session))
        .route("/sessions/:id/history", get(sessions::get_history))
        // Raw retrieval
        .route("/query", post(query::query))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let pipeline = state.pipeline();
    let config = state.config();

    Json(json!({
        "name": "docqa-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document question answering over an exact L2 vector index",
        "assistant": config.session.assistant_name,
        "index": {
            "chunks": pipeline.len(),
            "dimension": pipeline.dimension(),
            "sources": pipeline.sources(),
            "chunk_size": pipeline.chunker().chunk_size(),
            "chunk_overlap": pipeline.chunker().overlap(),
        },
        "providers": {
            "embedding": pipeline.embedder().provider_name(),
            "embedding_model": config.embeddings.model,
            "llm": state.llm().name(),
            "llm_model": state.llm().model(),
        },
        "sessions": state.sessions().len(),
        "endpoints": {
            "POST /api/upload": "Upload and ingest documents",
            "POST /api/chat": "Send a message within a session",
            "POST /api/clear": "Clear a session's history (all sessions when no id)",
            "GET /api/sessions": "List live sessions",
            "GET /api/sessions/:id/history": "Get a session transcript",
            "DELETE /api/sessions/:id": "Delete a session",
            "POST /api/query": "Retrieve nearest chunks without generation",
            "GET /api/info": "This document"
        }
    }))
}

#[cfg(test)]
pub(crate) fn test_state(
    dir: &std::path::Path,
    llm: std::sync::Arc<crate::testing::ScriptedLlm>,
) -> AppState {
    use crate::ingestion::FileExtractor;
    use crate::retrieval::RetrievalPipeline;
    use crate::testing::HashEmbedder;
    use std::sync::Arc;

    let mut config = crate::config::RagConfig::default();
    config.storage.data_dir = dir.join("processed");
    config.storage.raw_dir = dir.join("raw");
    config.embeddings.dimensions = 256;

    let pipeline = RetrievalPipeline::open(
        &config,
        Arc::new(HashEmbedder::new(256)),
        Arc::new(FileExtractor),
    )
    .unwrap();
    AppState::from_parts(config, Arc::new(pipeline), llm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_info_reports_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));

        let Json(value) = info(State(state)).await;
        assert_eq!(value["index"]["chunks"], 0);
        assert_eq!(value["index"]["dimension"], 256);
        assert_eq!(value["providers"]["llm"], "scripted");
    }
}
