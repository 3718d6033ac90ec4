//! Application state for the Q&A server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{SessionRegistry, SessionSettings};
use crate::ingestion::FileExtractor;
use crate::providers::{self, LlmProvider};
use crate::retrieval::RetrievalPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Index, embedder and chunker
    pipeline: Arc<RetrievalPipeline>,
    /// LLM provider (Ollama or OpenAI-compatible)
    llm: Arc<dyn LlmProvider>,
    /// Live chat sessions
    sessions: SessionRegistry,
}

impl AppState {
    /// Build providers from configuration and open the persisted index
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let embedder = providers::build_embedder(&config)?;
        let llm = providers::build_llm(&config)?;

        let pipeline = {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                RetrievalPipeline::open(&config, embedder, Arc::new(FileExtractor))
            })
            .await
            .map_err(|e| crate::error::Error::internal(format!("Task join error: {}", e)))??
        };
        tracing::info!(
            "Vector index ready: {} chunks, dimension {}",
            pipeline.len(),
            pipeline.dimension()
        );

        Ok(Self::from_parts(config, Arc::new(pipeline), llm))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: RagConfig,
        pipeline: Arc<RetrievalPipeline>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let sessions = SessionRegistry::new(
            Arc::clone(&pipeline),
            Arc::clone(&llm),
            SessionSettings::from_config(&config),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                llm,
                sessions,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &Arc<RetrievalPipeline> {
        &self.inner.pipeline
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    /// Ready once both the embedding service and the LLM answer their health checks
    pub async fn is_ready(&self) -> bool {
        let embedder_ok = self.pipeline().embedder().health_check().await.unwrap_or(false);
        embedder_ok && self.llm().health_check().await.unwrap_or(false)
    }
}
