//! Ollama-based providers for embeddings and generation
//!
//! Wraps the shared `OllamaClient` to implement the provider traits.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::generation::prompt::CODE_TEMPERATURE;
use crate::generation::{strip_code_fence, OllamaClient, PromptBuilder};
use crate::types::HistoryTurn;

use super::embedding::EmbeddingProvider;
use super::generation::GenerationService;

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
}

impl OllamaEmbedder {
    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama generation service
pub struct OllamaGenerator {
    client: Arc<OllamaClient>,
    connected: AtomicBool,
}

impl OllamaGenerator {
    /// Create from an existing OllamaClient. Reports disconnected until probed.
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self {
            client,
            connected: AtomicBool::new(false),
        }
    }

    /// Record whether a generation call reached the model
    fn track(&self, result: Result<String>) -> Result<String> {
        let ok = result.is_ok();
        if self.connected.swap(ok, Ordering::Relaxed) != ok {
            tracing::info!("Ollama connectivity changed: connected={}", ok);
        }
        result
    }
}

#[async_trait]
impl GenerationService for OllamaGenerator {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        self.track(self.client.generate(prompt, system_prompt, temperature).await)
    }

    async fn generate_with_context(
        &self,
        question: &str,
        passages: &[String],
        history: &[HistoryTurn],
    ) -> Result<String> {
        tracing::debug!(
            "Generating grounded answer from {} passages and {} prior turns",
            passages.len(),
            history.len()
        );
        let prompt = PromptBuilder::build_context_prompt(question, passages, history);
        let answer = self
            .client
            .generate(
                &prompt,
                Some(PromptBuilder::context_system_prompt()),
                self.client.config().temperature,
            )
            .await;
        self.track(answer)
    }

    async fn generate_code(&self, description: &str, language: &str) -> Result<String> {
        let prompt = PromptBuilder::build_code_prompt(description, language);
        let system = PromptBuilder::code_system_prompt(language);
        let answer = self.track(
            self.client
                .generate(&prompt, Some(&system), CODE_TEMPERATURE)
                .await,
        )?;
        Ok(strip_code_fence(&answer))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn check_connection(&self) -> bool {
        let ok = self.client.health_check().await;
        self.connected.store(ok, Ordering::Relaxed);

        let base_url = &self.client.config().base_url;
        if ok {
            tracing::info!("Ollama is running at {}", base_url);
        } else {
            tracing::warn!("Ollama not available at {}", base_url);
            tracing::warn!("  Start it with: ollama serve");
            tracing::warn!(
                "  Pull models: ollama pull {} && ollama pull {}",
                self.client.config().generate_model,
                self.client.config().embed_model
            );
        }
        ok
    }

    fn model(&self) -> &str {
        &self.client.config().generate_model
    }
}
