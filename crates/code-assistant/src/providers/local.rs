//! Local retrieval implementation: parse, chunk and embed on this machine
//!
//! Chunks and their embeddings live in a `VectorIndex` SQLite file next to
//! the application database.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::ingestion::{FileParser, TextChunker};
use crate::retrieval::{IndexedChunk, VectorIndex};

use super::embedding::EmbeddingProvider;
use super::retrieval::{DocumentMetadata, RetrievalService, SearchHit};

/// Retrieval service backed by the local vector index
pub struct LocalRetrieval {
    config: RetrievalConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: RwLock<Option<VectorIndex>>,
}

impl LocalRetrieval {
    /// Create an uninitialized service; call `initialize` before use
    pub fn new(config: RetrievalConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            index: RwLock::new(None),
        }
    }

    /// Create a ready service over an already open index
    pub fn with_index(
        config: RetrievalConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
    ) -> Self {
        Self {
            config,
            embedder,
            index: RwLock::new(Some(index)),
        }
    }

    fn index(&self) -> Result<VectorIndex> {
        self.index
            .read()
            .clone()
            .ok_or_else(|| Error::ServiceUnavailable("Retrieval index is not initialized".to_string()))
    }

    fn chunker(&self) -> TextChunker {
        TextChunker::new(self.config.chunk_size, self.config.chunk_overlap)
            .with_min_size(self.config.min_chunk_size)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[async_trait]
impl RetrievalService for LocalRetrieval {
    async fn initialize(&self) -> Result<()> {
        let path: PathBuf = self.config.index_path.clone();
        let index = tokio::task::spawn_blocking(move || VectorIndex::open(path)).await??;
        let stats = index.stats()?;
        tracing::info!(
            "Vector index ready at {} ({} chunks from {} documents)",
            self.config.index_path.display(),
            stats.total_chunks,
            stats.total_documents
        );
        *self.index.write() = Some(index);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let index = self.index()?;
        let embedding = self.embedder.embed(query).await?;
        tokio::task::spawn_blocking(move || index.search(&embedding, k)).await?
    }

    async fn add_document(
        &self,
        file_path: &Path,
        document_id: &str,
        mut metadata: DocumentMetadata,
    ) -> Result<usize> {
        let index = self.index()?;

        let data = tokio::fs::read(file_path).await?;
        let parse_name = file_name(file_path);
        let parsed =
            tokio::task::spawn_blocking(move || FileParser::parse(&parse_name, &data)).await??;

        let chunks = self.chunker().chunk(&parsed.content);
        if chunks.is_empty() {
            return Err(Error::file_parse(file_name(file_path), "No chunks produced"));
        }

        let source = metadata
            .get("filename")
            .cloned()
            .unwrap_or_else(|| file_name(file_path));
        metadata.insert("document_id".to_string(), document_id.to_string());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                chunk_index: chunk.index,
                content: chunk.content,
                source: source.clone(),
                metadata: metadata.clone(),
                embedding,
            })
            .collect();

        tracing::debug!("Embedded {} chunks for document {}", indexed.len(), document_id);

        let document_id = document_id.to_string();
        tokio::task::spawn_blocking(move || index.insert_document(&document_id, &indexed)).await?
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let index = self.index()?;
        let document_id = document_id.to_string();
        tokio::task::spawn_blocking(move || index.delete_document(&document_id)).await?
    }

    async fn statistics(&self) -> Result<serde_json::Value> {
        let index = self.index()?;
        let stats = tokio::task::spawn_blocking(move || index.stats()).await??;
        Ok(json!({
            "total_chunks": stats.total_chunks,
            "total_documents": stats.total_documents,
            "dimensions": stats.dimensions,
            "embedding_provider": self.embedder.name(),
            "index_path": self.config.index_path.display().to_string(),
        }))
    }
}
