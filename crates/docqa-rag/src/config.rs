//! Configuration for the document Q&A system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Language model configuration
    pub llm: LlmConfig,
    /// On-disk layout for raw documents and the vector index
    pub storage: StorageConfig,
    /// Chat session behaviour
    pub session: SessionConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        let config: RagConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config '{}': {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `DOCQA_CONFIG` if set, otherwise defaults; then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("DOCQA_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override selected fields from `DOCQA_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("DOCQA_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env_parse("DOCQA_PORT") {
            self.server.port = v;
        }
        if let Ok(v) = std::env::var("DOCQA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCQA_RAW_DIR") {
            self.storage.raw_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCQA_EMBED_MODEL") {
            self.embeddings.model = v;
        }
        if let Some(v) = env_parse("DOCQA_EMBED_DIMENSIONS") {
            self.embeddings.dimensions = v;
        }
        if let Ok(v) = std::env::var("DOCQA_LLM_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCQA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCQA_LLM_BACKEND") {
            match v.to_lowercase().as_str() {
                "ollama" => self.llm.backend = LlmBackend::Ollama,
                "openai" => self.llm.backend = LlmBackend::OpenAi,
                other => tracing::warn!("Ignoring unknown DOCQA_LLM_BACKEND '{}'", other),
            }
        }
    }

    /// Reject settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be > 0".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be > 0".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}='{}'", key, raw);
            None
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama embedding model
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text, 384 for all-minilm)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Ollama base URL used for embeddings
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk width in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Which completion API to talk to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server (`/api/generate`)
    #[default]
    Ollama,
    /// Any OpenAI-compatible `/chat/completions` endpoint (Groq, OpenAI, vLLM)
    OpenAi,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend selection
    pub backend: LlmBackend,
    /// Base URL (Ollama root, or OpenAI-compatible `/v1` root)
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible only)
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted index
    pub data_dir: PathBuf,
    /// Directory uploads are written to before ingestion
    pub raw_dir: PathBuf,
    /// Base file name of the index files inside `data_dir`
    pub index_name: String,
}

impl StorageConfig {
    /// Base path shared by the index and metadata files
    pub fn index_base(&self) -> PathBuf {
        self.data_dir.join(&self.index_name)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docqa-rag");

        Self {
            data_dir: root.join("processed"),
            raw_dir: root.join("raw"),
            index_name: "vector_store".to_string(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Name the assistant introduces itself with in prompts
    pub assistant_name: String,
    /// Sessions idle longer than this are dropped by the registry
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            assistant_name: "York St John University".to_string(),
            idle_timeout_secs: 3600,
        }
    }
}
