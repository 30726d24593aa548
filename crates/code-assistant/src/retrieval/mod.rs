//! Vector retrieval over indexed document chunks

mod index;

pub use index::{cosine_similarity, IndexStats, IndexedChunk, VectorIndex};
