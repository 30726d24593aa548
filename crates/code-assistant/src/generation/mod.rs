//! Answer generation with Ollama and prompt templates

pub mod ollama;
pub mod prompt;

pub use ollama::OllamaClient;
pub use prompt::{strip_code_fence, PromptBuilder};
