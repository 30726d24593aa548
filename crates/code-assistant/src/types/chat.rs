//! Chat sessions, messages and citations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to sessions created without one
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Maximum characters kept from a query when it becomes a session title
pub const SESSION_TITLE_CHARS: usize = 50;

/// Maximum characters of a citation preview, marker included
pub const CITATION_PREVIEW_CHARS: usize = 200;

const TRUNCATION_MARKER: &str = "...";

/// A conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// New session titled after the first characters of the opening query
    pub fn from_query(query: &str, user_id: Option<Uuid>) -> Self {
        let title: String = query.chars().take(SESSION_TITLE_CHARS).collect();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: if title.trim().is_empty() {
                DEFAULT_SESSION_TITLE.to_string()
            } else {
                title
            },
            created_at: Utc::now(),
        }
    }
}

/// Session listing entry
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Author of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "assistant" {
            Self::Assistant
        } else {
            Self::User
        }
    }
}

/// A retrieved passage shown next to an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceCitation {
    /// Preview of the passage
    pub content: String,
    /// Source label (file name)
    pub source: String,
    pub document_id: Option<String>,
}

impl SourceCitation {
    pub fn new(content: &str, source: impl Into<String>, document_id: Option<String>) -> Self {
        Self {
            content: preview(content, CITATION_PREVIEW_CHARS),
            source: source.into(),
            document_id,
        }
    }
}

/// Shorten text to at most `max_chars` characters, marking truncation with "..."
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub sources: Vec<SourceCitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(session_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            role: MessageRole::User,
            content: content.into(),
            sources: Vec::new(),
            response_time_ms: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(
        session_id: Uuid,
        content: impl Into<String>,
        sources: Vec<SourceCitation>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            role: MessageRole::Assistant,
            content: content.into(),
            sources,
            response_time_ms: Some(response_time_ms),
            created_at: Utc::now(),
        }
    }
}

/// Prior turn handed to the generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for HistoryTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}
