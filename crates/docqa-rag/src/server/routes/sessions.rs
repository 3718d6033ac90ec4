//! Session inspection and deletion

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// GET /api/sessions - List live session ids
pub async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    let ids = state.sessions().ids();
    Json(json!({ "sessions": ids, "total": ids.len() }))
}

/// GET /api/sessions/:id/history - Transcript of one session
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    let session = state
        .sessions()
        .get(&id)
        .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
    let session = session.lock().await;

    Ok(Json(json!({
        "session_id": id,
        "history": session.history(),
        "created_at": session.created_at(),
        "last_active": session.last_active(),
    })))
}

/// DELETE /api/sessions/:id - Drop a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    if !state.sessions().remove(&id) {
        return Err(Error::SessionNotFound(id.to_string()));
    }
    tracing::info!("Deleted session {}", id);
    Ok(Json(json!({ "status": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::test_state;
    use crate::testing::ScriptedLlm;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_history_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), Arc::new(ScriptedLlm::new()));
        let (id, session) = state.sessions().create();
        session.lock().await.respond("Hello").await.unwrap();

        let Json(value) = get_history(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(value["history"].as_array().unwrap().len(), 2);
        assert_eq!(value["history"][0]["role"], "user");

        delete_session(State(state.clone()), Path(id)).await.unwrap();
        assert!(matches!(
            get_history(State(state.clone()), Path(id)).await,
            Err(Error::SessionNotFound(_))
        ));
        assert!(matches!(
            delete_session(State(state), Path(id)).await,
            Err(Error::SessionNotFound(_))
        ));
    }
}
