//! SQLite-backed vector index with brute-force cosine ranking

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{DocumentMetadata, SearchHit};

/// A chunk with its embedding, as stored in the index
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk_index: usize,
    pub content: String,
    pub source: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_documents: usize,
    /// Embedding width of the stored vectors (0 when empty)
    pub dimensions: usize,
}

/// Vector index persisted in its own SQLite file
#[derive(Clone)]
pub struct VectorIndex {
    conn: Arc<Mutex<Connection>>,
}

impl VectorIndex {
    /// Create or open the index at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::retrieval(format!("Failed to open vector index: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::retrieval(format!("Failed to set pragmas: {}", e)))?;

        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.migrate()?;
        Ok(index)
    }

    /// Create an in-memory index (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::retrieval(format!("Failed to open in-memory index: {}", e)))?;
        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.migrate()?;
        Ok(index)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                metadata_json TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON chunks(document_id);
            "#,
        )
        .map_err(|e| Error::retrieval(format!("Failed to migrate vector index: {}", e)))?;
        Ok(())
    }

    /// Store the chunks of a document, replacing any previously indexed chunks
    pub fn insert_document(&self, document_id: &str, chunks: &[IndexedChunk]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let replaced = tx.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])?;
        if replaced > 0 {
            tracing::debug!("Replacing {} existing chunks of {}", replaced, document_id);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (document_id, chunk_index, content, source, metadata_json, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    document_id,
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.source,
                    serde_json::to_string(&chunk.metadata)?,
                    encode_embedding(&chunk.embedding),
                ])?;
            }
        }

        tx.commit()?;
        Ok(chunks.len())
    }

    /// Remove every chunk of a document
    pub fn delete_document(&self, document_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])?;
        Ok(removed)
    }

    /// Top `k` chunks by cosine similarity to `query`, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT content, source, metadata_json, embedding FROM chunks")?;
        let rows = stmt.query_map([], |row| {
            let content: String = row.get(0)?;
            let source: String = row.get(1)?;
            let metadata_json: String = row.get(2)?;
            let blob: Vec<u8> = row.get(3)?;
            Ok((content, source, metadata_json, blob))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (content, source, metadata_json, blob) = row?;
            let embedding = decode_embedding(&blob);
            if embedding.len() != query.len() {
                continue;
            }
            hits.push(SearchHit {
                content,
                source,
                metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
                score: cosine_similarity(query, &embedding),
            });
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let conn = self.conn.lock();
        let (total_chunks, total_documents): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT document_id) FROM chunks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let dimensions: Option<i64> = conn
            .query_row("SELECT length(embedding) / 4 FROM chunks LIMIT 1", [], |row| row.get(0))
            .ok();

        Ok(IndexStats {
            total_chunks: total_chunks as usize,
            total_documents: total_documents as usize,
            dimensions: dimensions.unwrap_or(0) as usize,
        })
    }
}

/// Cosine similarity of two equal-length vectors (0.0 when either is zero)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
