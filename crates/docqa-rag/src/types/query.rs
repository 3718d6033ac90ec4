//! Request types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message
    #[serde(default)]
    pub message: String,
    /// Existing session to continue; a new one is created when absent
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Clear request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Raw retrieval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to search for
    pub question: String,

    /// Number of chunks to retrieve (default: 3)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}
