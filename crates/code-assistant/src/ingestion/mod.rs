//! Document ingestion: upload handling, text extraction and chunking

mod chunker;
mod parser;
pub mod upload;

pub use chunker::{TextChunk, TextChunker};
pub use parser::{FileParser, ParsedDocument};
