//! Provider abstractions for embeddings and language models
//!
//! The pipeline only ever sees the traits; which backend sits behind them is
//! decided once at startup from [`RagConfig`].

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod retry;

use std::sync::Arc;

use crate::config::{LlmBackend, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::OpenAiCompatibleLlm;
pub use retry::RetryPolicy;

/// Build the embedding provider named by the configuration
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder = OllamaEmbedder::new(&config.embeddings)?;
    tracing::info!(
        "Embedding provider: ollama ({}, {} dims)",
        config.embeddings.model,
        config.embeddings.dimensions
    );
    Ok(Arc::new(embedder))
}

/// Build the LLM provider named by the configuration
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        LlmBackend::OpenAi => Arc::new(OpenAiCompatibleLlm::new(&config.llm)?),
    };
    tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());
    Ok(llm)
}
