//! Q&A server binary
//!
//! Run with: cargo run -p docqa-rag --bin docqa-rag-server

use docqa_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {} ({} dims)", config.embeddings.model, config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.model);
    tracing::info!("  - Chunking: {} chars, {} overlap", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Index: {}", config.storage.index_base().display());
    tracing::info!("  - Uploads: {}", config.storage.raw_dir.display());

    let server = RagServer::new(config).await?;

    let state = server.state();
    if !state.pipeline().embedder().health_check().await.unwrap_or(false) {
        tracing::warn!("Embedding service not reachable; ingestion and retrieval will fail");
        tracing::warn!("  Start Ollama with `ollama serve` and pull the embedding model");
    }
    if !state.llm().health_check().await.unwrap_or(false) {
        tracing::warn!("LLM provider {} not available", state.llm().name());
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload - Upload documents");
    println!("  POST /api/chat   - Ask questions");
    println!("  POST /api/clear  - Reset a conversation");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
