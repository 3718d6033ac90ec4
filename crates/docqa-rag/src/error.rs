//! Error types for the document Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], so callers can branch on kind
/// instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad caller input; no state was mutated
    Input,
    /// A document could not be turned into text
    Extraction,
    /// Vector width disagrees with the index
    DimensionMismatch,
    /// Index store missing, corrupt, or not writable
    Persistence,
    /// Embedding or language-model call failed
    Generation,
    /// Anything else
    Internal,
}

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat message was empty or whitespace only
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Malformed HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Text extraction failed
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Extraction succeeded but produced nothing to index
    #[error("No text extracted from '{0}'")]
    NoText(String),

    /// Vector width does not match the index
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector contains NaN or infinite components
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Index store could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Index store files exist but disagree with each other
    #[error("Corrupt index store at '{}': {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// External call exceeded its deadline
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt store error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_)
            | Error::EmptyMessage
            | Error::InvalidRequest(_)
            | Error::FileNotFound(_)
            | Error::UnsupportedFileType(_)
            | Error::SessionNotFound(_) => ErrorKind::Input,
            Error::Extraction { .. } | Error::NoText(_) => ErrorKind::Extraction,
            Error::DimensionMismatch { .. } | Error::InvalidVector(_) => {
                ErrorKind::DimensionMismatch
            }
            Error::Persistence(_) | Error::CorruptStore { .. } | Error::Io(_) | Error::Json(_) => {
                ErrorKind::Persistence
            }
            Error::Embedding(_) | Error::Llm(_) | Error::Timeout { .. } | Error::Http(_) => {
                ErrorKind::Generation
            }
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::SessionNotFound(_) | Error::FileNotFound(_) => StatusCode::NOT_FOUND,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => match self.kind() {
                ErrorKind::Input | ErrorKind::Extraction => StatusCode::BAD_REQUEST,
                ErrorKind::Generation => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::DimensionMismatch | ErrorKind::Persistence | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        };

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::EmptyMessage.kind(), ErrorKind::Input);
        assert_eq!(Error::NoText("a.txt".into()).kind(), ErrorKind::Extraction);
        assert_eq!(
            Error::DimensionMismatch { expected: 3, actual: 4 }.kind(),
            ErrorKind::DimensionMismatch
        );
        assert_eq!(Error::corrupt("x", "bad").kind(), ErrorKind::Persistence);
        assert_eq!(Error::llm("quota").kind(), ErrorKind::Generation);
    }

    #[test]
    fn test_empty_message_is_bad_request() {
        let response = Error::EmptyMessage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
