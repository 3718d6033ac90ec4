//! Ollama-based providers for embeddings and generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::RetryPolicy;

/// Ollama HTTP client with automatic retry
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(max_retries),
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed a batch of texts in one `/api/embed` call
    pub async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let url = &url;

        self.retry
            .run("Ollama embedding", move || async move {
                let response = self
                    .client
                    .post(url)
                    .json(&EmbedRequest { model, input: texts })
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::embedding(format!("HTTP {} - {}", status, body)));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::embedding(format!("invalid response: {}", e)))?;
                Ok(parsed.embeddings)
            })
            .await
    }

    /// Non-streaming completion via `/api/generate`
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!("Generating with Ollama model {}", model);

        let url = &url;
        self.retry
            .run("Ollama generation", move || async move {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                    options: GenerateOptions { temperature },
                };

                let response = self
                    .client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::llm(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let parsed: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;
                Ok(parsed.response)
            })
            .await
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create from embedding configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.base_url, config.timeout_secs, 2)?,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("Ollama returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.client.embed(&self.model, texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create from LLM configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.base_url, config.timeout_secs, config.max_retries)?,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt, self.temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_request_shape() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(EmbedRequest { model: "nomic-embed-text", input: &texts })
            .unwrap();
        assert_eq!(body["model"], "nomic-embed-text");
        assert_eq!(body["input"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 5, 0).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unhealthy() {
        let embedder = OllamaEmbedder::new(&EmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..EmbeddingConfig::default()
        })
        .unwrap();
        assert!(!embedder.health_check().await.unwrap());
    }
}
