//! Collaborator abstractions for retrieval, generation, embeddings and OCR
//!
//! Handlers and workflows only see these traits. The server wires concrete
//! implementations (Ollama, the local SQLite index, tesseract) at startup and
//! tests substitute stubs.

pub mod embedding;
pub mod generation;
pub mod local;
pub mod ocr;
pub mod ollama;
pub mod retrieval;

pub use embedding::EmbeddingProvider;
pub use generation::GenerationService;
pub use local::LocalRetrieval;
pub use ocr::{OcrEngine, TesseractOcr};
pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use retrieval::{DocumentMetadata, RetrievalService, SearchHit};
