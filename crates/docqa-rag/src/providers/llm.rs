//! LLM provider trait for completing prompts

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt completion.
///
/// Given a prompt string, returns a completion string; may fail with a
/// transient, auth or quota error.
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (`/api/generate`)
/// - `OpenAiCompatibleLlm`: Groq, OpenAI or any `/chat/completions` server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
