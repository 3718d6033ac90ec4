//! Chat and clear endpoints

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, ClearRequest};

/// POST /api/chat - Answer one message within a session
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }

    let (session_id, session) = state.sessions().get_or_create(request.session_id);
    let mut session = session.lock().await;

    tracing::info!("Chat [{}]: \"{}\"", session_id, request.message);
    let reply = session.respond(&request.message).await?;

    Ok(Json(ChatResponse {
        response: reply.text,
        history: session.history().to_vec(),
        session_id,
    }))
}

/// POST /api/clear - Reset one session's history, or every session's when no id is given
pub async fn clear(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let request: ClearRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ClearRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidRequest(format!("invalid clear request: {}", e)))?
    };

    match request.session_id {
        Some(id) => {
            if let Some(session) = state.sessions().get(&id) {
                session.lock().await.clear();
            }
        }
        None => {
            for id in state.sessions().ids() {
                if let Some(session) = state.sessions().get(&id) {
                    session.lock().await.clear();
                }
            }
        }
    }

    Ok(Json(json!({ "status": "success" })))
}
