//! Fixed-width text chunking with overlap and position tracking

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Default chunk width in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap in characters
pub const DEFAULT_OVERLAP: usize = 200;

/// Text chunker with configurable size and overlap.
///
/// Slices purely by character count; there is no sentence or paragraph
/// awareness. Positions are character offsets, so multi-byte text is never
/// split inside a code point.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Chunk width in characters
    chunk_size: usize,
    /// Characters shared between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. `overlap` must be smaller than `chunk_size`,
    /// otherwise the start offset would never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into overlapping chunks. Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(total_chars / (self.chunk_size - self.overlap) + 1);
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            let overlap = if chunks.is_empty() { 0 } else { self.overlap };

            chunks.push(Chunk {
                text: text[boundaries[start]..boundaries[end]].to_string(),
                start,
                end,
                overlap,
            });

            if end == total_chars {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// One-shot chunking with explicit parameters
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(chunk_size, overlap)?.chunk(text))
}
