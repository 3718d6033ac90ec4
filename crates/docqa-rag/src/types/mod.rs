//! Core types for the document Q&A system

pub mod conversation;
pub mod document;
pub mod query;
pub mod response;

pub use conversation::{ConversationTurn, Role};
pub use document::{Chunk, ChunkMetadata, EmbeddedChunk, EntryId, FileType, ScoredChunk};
pub use query::{ChatRequest, ClearRequest, QueryRequest};
pub use response::{
    ChatResponse, DocumentSummary, IngestError, IngestReport, QueryResponse, UploadResponse,
};
