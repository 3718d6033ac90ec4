//! Prompt templates for grounded and fallback answers

use crate::types::ScoredChunk;

/// Prompt builder for chat turns
pub struct PromptBuilder;

impl PromptBuilder {
    /// Retrieved chunk texts joined by blank lines, in rank order
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.metadata.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Prompt used when retrieval produced usable context
    pub fn grounded(assistant_name: &str, context: &str, question: &str) -> String {
        format!(
            "You are a helpful assistant for {assistant_name} students. Use the following \
             context to answer the question. If you don't know the answer, say that you \
             don't have enough information and suggest contacting the university directly.\n\n\
             Context: {context}\n\n\
             Question: {question}\n\n\
             Helpful Answer:"
        )
    }

    /// Prompt used when there is nothing to ground the answer on
    pub fn direct(assistant_name: &str, question: &str) -> String {
        format!("As a {assistant_name} assistant, please answer: {question}")
    }
}
