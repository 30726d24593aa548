//! Retrieval service trait for indexing documents and searching passages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Free-form metadata attached to every chunk of a document
pub type DocumentMetadata = HashMap<String, String>;

/// A passage returned by a search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Full passage text
    pub content: String,
    /// Source label, usually the file name
    pub source: String,
    /// Metadata stored with the chunk (`document_id`, `filename`, ...)
    pub metadata: DocumentMetadata,
    /// Similarity score
    pub score: f32,
}

impl SearchHit {
    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get("document_id").map(String::as_str)
    }
}

/// Trait for the retrieval collaborator
///
/// Implementations:
/// - `LocalRetrieval`: parses, chunks and embeds locally, vectors in SQLite
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Open the index; until this succeeds `is_ready` is false
    async fn initialize(&self) -> Result<()>;

    /// Whether the service can serve searches
    fn is_ready(&self) -> bool;

    /// Top `k` passages for a query, best first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>>;

    /// Index a file under a document id. Returns the number of chunks stored.
    async fn add_document(
        &self,
        file_path: &Path,
        document_id: &str,
        metadata: DocumentMetadata,
    ) -> Result<usize>;

    /// Remove every chunk of a document. Returns the number removed.
    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    /// Index statistics for the admin dashboard
    async fn statistics(&self) -> Result<serde_json::Value>;
}
