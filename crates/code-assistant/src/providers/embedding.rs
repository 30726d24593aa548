//! Embedding provider trait used to vectorize chunks and queries

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};

use crate::error::Result;

/// Chunks embedded concurrently by the default `embed_batch`
pub const EMBED_CONCURRENCY: usize = 4;

/// Turns text into vectors for the retrieval index
///
/// Implemented by `OllamaEmbedder`; tests use small deterministic stubs.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, a few requests in flight at once. Output order matches input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let requests: Vec<_> = texts.iter().map(|text| self.embed(text)).collect();
        futures::stream::iter(requests)
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Short label shown in retrieval statistics
    fn name(&self) -> &str;
}
