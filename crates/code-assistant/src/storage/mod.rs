//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for users, documents, chat sessions and messages.

mod database;

pub use database::{Database, ProcessingOutcome, StoreCounts};
