//! Chunk and query embedding on top of an [`EmbeddingProvider`]

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, EmbeddedChunk};

/// Batches texts into provider calls and checks what comes back.
///
/// One instance serves both ingestion and queries, so documents and questions
/// always land in the same vector space.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Width of every vector this embedder produces
    pub fn dimension(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.provider.health_check().await
    }

    /// Embed a single text (a batch of one)
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("provider returned no vector"))
    }

    /// Embed every chunk of one document, preserving order
    pub async fn embed_many(&self, chunks: Vec<Chunk>, source: &str) -> Result<Vec<EmbeddedChunk>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed_texts(&texts).await?;

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| EmbeddedChunk {
                chunk,
                source: source.to_string(),
                embedding,
            })
            .collect())
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dimension = self.dimension();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let embedded = self.provider.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} vectors for {} inputs",
                    self.provider.name(),
                    embedded.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = embedded.iter().find(|v| v.len() != dimension) {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: bad.len(),
                });
            }
            vectors.extend(embedded);
        }

        tracing::debug!("Embedded {} texts in batches of {}", texts.len(), self.batch_size);
        Ok(vectors)
    }
}
