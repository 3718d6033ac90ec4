//! Document text extraction and chunking

mod chunker;
mod parser;

pub use chunker::{chunk_text, TextChunker, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use parser::{discover_documents, display_name, DocumentExtractor, ExtractedText, FileExtractor};
