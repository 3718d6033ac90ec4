//! Document, chunk and index-entry types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A contiguous span of a document's extracted text.
///
/// `start` and `end` are character offsets (half-open). `overlap` is the number
/// of characters shared with the previous chunk, 0 for the first chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub overlap: usize,
}

impl Chunk {
    /// Width of the span in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A chunk with its embedding and the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    /// Source file name
    pub source: String,
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    /// Metadata stored in the index alongside the vector
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            text: self.chunk.text.clone(),
            start: self.chunk.start,
            end: self.chunk.end,
            overlap: self.chunk.overlap,
            source: self.source.clone(),
            extra: BTreeMap::new(),
        }
    }
}

/// Stable identifier assigned to an index entry when it is appended
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-entry metadata persisted in the sidecar file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub overlap: usize,
    pub source: String,
    /// Arbitrary additional fields, kept verbatim through save/load
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A search hit: metadata resolved through its entry id, plus L2 distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: EntryId,
    #[serde(flatten)]
    pub metadata: ChunkMetadata,
    /// Euclidean distance to the query (lower is closer)
    pub distance: f32,
}
