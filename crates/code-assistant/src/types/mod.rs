//! Core domain types

pub mod chat;
pub mod document;
pub mod user;

pub use chat::{ChatSession, HistoryTurn, Message, MessageRole, SessionSummary, SourceCitation};
pub use document::{Document, DocumentStatus, FileKind};
pub use user::User;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way it is stored: RFC 3339, UTC, microseconds
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to now for unreadable values
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
