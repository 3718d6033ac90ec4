//! Response types for ingestion, chat and query

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};

use super::conversation::ConversationTurn;
use super::document::{FileType, ScoredChunk};

/// Outcome of one `RetrievalPipeline::ingest` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Files that produced indexed chunks
    pub documents: Vec<DocumentSummary>,
    /// Files that could not be ingested; the rest of the batch went ahead
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<IngestError>,
    /// Total chunks added to the index by this call
    pub total_chunks_created: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl IngestReport {
    /// True when at least one file was indexed and none failed
    pub fn is_complete_success(&self) -> bool {
        !self.documents.is_empty() && self.errors.is_empty()
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            format!(
                "Successfully processed {} documents ({} chunks).",
                self.documents.len(),
                self.total_chunks_created
            )
        } else {
            let failed: Vec<&str> = self.errors.iter().map(|e| e.filename.as_str()).collect();
            format!(
                "Processed {} documents ({} chunks); failed: {}",
                self.documents.len(),
                self.total_chunks_created,
                failed.join(", ")
            )
        }
    }

    pub(crate) fn record_failure(&mut self, filename: impl Into<String>, error: &Error) {
        self.errors.push(IngestError {
            filename: filename.into(),
            error: error.to_string(),
            kind: error.kind(),
        });
    }
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Characters of extracted text
    pub text_length: usize,
    /// Number of chunks created
    pub total_chunks: usize,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

/// Ingestion error for a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    /// Filename that failed
    pub filename: String,
    /// Error message
    pub error: String,
    /// Error classification
    pub kind: ErrorKind,
}

/// Response for `POST /api/upload`
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Summary message
    pub message: String,
    /// Names the uploads were stored under
    pub filenames: Vec<String>,
    /// Uploads rejected for their extension
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Ingestion report, absent when nothing was ingestible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IngestReport>,
}

/// Response for `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Assistant answer (or user-facing error text)
    pub response: String,
    /// Full transcript of the session after this turn
    pub history: Vec<ConversationTurn>,
    /// Session the turn was recorded in
    pub session_id: Uuid,
}

/// Response for `POST /api/query`
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub results: Vec<ScoredChunk>,
    pub processing_time_ms: u64,
}
