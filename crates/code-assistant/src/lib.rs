//! code-assistant: document-grounded coding assistant backend
//!
//! Users upload documents which are indexed in the background, then ask
//! questions that are answered by a local Ollama model, optionally grounded on
//! passages retrieved from the indexed documents. Chat sessions, messages,
//! users and documents are kept in SQLite.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{
    chat::{ChatSession, Message, MessageRole, SourceCitation},
    document::{Document, DocumentStatus, FileKind},
    user::User,
};
