//! Generation service trait for producing answers and code

use async_trait::async_trait;

use crate::error::Result;
use crate::types::HistoryTurn;

/// Trait for language-model text generation
///
/// Implementations:
/// - `OllamaGenerator`: Local Ollama server (codellama by default)
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Free-form generation with an optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String>;

    /// Answer a question grounded on retrieved passages and prior turns
    async fn generate_with_context(
        &self,
        question: &str,
        passages: &[String],
        history: &[HistoryTurn],
    ) -> Result<String>;

    /// Produce a code snippet in the given language
    async fn generate_code(&self, description: &str, language: &str) -> Result<String>;

    /// Whether the last probe or generation call reached the backend
    fn is_connected(&self) -> bool;

    /// Probe the backend and update the connectivity flag
    async fn check_connection(&self) -> bool;

    /// Model used for generation
    fn model(&self) -> &str;
}
