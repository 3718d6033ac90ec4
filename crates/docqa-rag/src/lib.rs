//! docqa-rag: document question answering over your own files
//!
//! Documents (PDF, DOCX, TXT, Markdown) are split into overlapping character
//! chunks, embedded through an [`providers::EmbeddingProvider`] and stored in an
//! exact L2 [`retrieval::VectorIndex`] persisted next to a JSON metadata file.
//! [`generation::ConversationSession`]s retrieve the closest chunks for each
//! message and ask an [`providers::LlmProvider`] for a grounded answer.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, ErrorKind, Result};
pub use generation::{ConversationSession, Reply, ReplyKind, SessionRegistry};
pub use retrieval::{RetrievalPipeline, VectorIndex};
pub use types::{
    document::{Chunk, ChunkMetadata, EntryId, FileType, ScoredChunk},
    response::IngestReport,
};
