//! Ollama HTTP client for generation and embeddings with retry logic

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
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
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Llm("Unknown error".to_string())))
    }

    /// POST a JSON body and decode the JSON answer, with retries
    async fn post_json<B, R>(&self, path: &str, body: &B, what: &'static str) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        self.retry_request(|| {
            let url = url.clone();
            let client = self.client.clone();

            async move {
                let response = client
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("{} request failed: {}", what, e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "{} failed: HTTP {} - {}",
                        what, status, body
                    )));
                }

                response
                    .json::<R>()
                    .await
                    .map_err(|e| Error::Llm(format!("Failed to parse {} response: {}", what, e)))
            }
        })
        .await
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Generate an embedding using Ollama with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.config.embed_model.clone(),
            prompt: text.to_string(),
        };

        let response: EmbedResponse = self
            .post_json("/api/embeddings", &request, "Embedding")
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if response.embedding.is_empty() {
            return Err(Error::Embedding(format!(
                "Model {} returned an empty embedding",
                self.config.embed_model
            )));
        }

        Ok(response.embedding)
    }

    /// Generate a completion with an optional system prompt
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.generate_model.clone(),
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
            stream: false,
            options: GenerateOptions { temperature },
        };

        tracing::info!("Generating answer with model: {}", self.config.generate_model);

        let response: GenerateResponse = self
            .post_json("/api/generate", &request, "Generation")
            .await?;

        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::{get, post}, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_mock() -> String {
        let app = Router::new()
            .route("/api/tags", get(|| async { Json(json!({ "models": [] })) }))
            .route(
                "/api/generate",
                post(|Json(body): Json<Value>| async move {
                    let system = body["system"].as_str().unwrap_or("none").to_string();
                    Json(json!({ "response": format!("system={system}"), "done": true }))
                }),
            )
            .route(
                "/api/embeddings",
                post(|| async { Json(json!({ "embedding": [0.1, 0.2, 0.3] })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            max_retries: 0,
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_and_embed_against_mock() {
        let client = OllamaClient::new(&config(spawn_mock().await)).unwrap();

        assert!(client.health_check().await);
        assert_eq!(
            client.generate("hi", Some("be brief"), 0.7).await.unwrap(),
            "system=be brief"
        );
        assert_eq!(client.generate("hi", None, 0.7).await.unwrap(), "system=none");
        assert_eq!(client.embed("text").await.unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = OllamaClient::new(&config("http://127.0.0.1:9".to_string())).unwrap();
        assert!(!client.health_check().await);
        assert!(matches!(client.generate("hi", None, 0.7).await, Err(Error::Llm(_))));
        assert!(matches!(client.embed("hi").await, Err(Error::Embedding(_))));
    }
}
