//! Administrative reporting over the store and the collaborators

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::{GenerationService, RetrievalService};
use crate::storage::{Database, StoreCounts};
use crate::types::{ChatSession, Document, DocumentStatus};

/// Rows shown per list in the recent activity view
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SystemStats {
    pub users: UserStats,
    pub documents: DocumentStats,
    pub chat: ChatStats,
    /// Retrieval statistics, empty object when retrieval is not ready
    pub rag: serde_json::Value,
    pub services: ServiceStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentStats {
    pub total: usize,
    pub completed: usize,
    /// Everything not completed, failed documents included
    pub processing: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatStats {
    pub total_sessions: usize,
    pub total_messages: usize,
    pub avg_messages_per_session: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub ollama: bool,
    pub rag: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub recent_documents: Vec<RecentDocument>,
    pub recent_sessions: Vec<RecentSession>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentDocument {
    pub id: Uuid,
    pub title: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Document> for RecentDocument {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            status: doc.status,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentSession {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatSession> for RecentSession {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title,
            created_at: session.created_at,
        }
    }
}

/// Messages per session rounded to two decimals, 0 without sessions
pub fn average_messages_per_session(total_messages: usize, total_sessions: usize) -> f64 {
    if total_sessions == 0 {
        return 0.0;
    }
    let avg = total_messages as f64 / total_sessions as f64;
    (avg * 100.0).round() / 100.0
}

fn summarize(counts: &StoreCounts) -> (UserStats, DocumentStats, ChatStats) {
    (
        UserStats {
            total: counts.total_users,
            active: counts.active_users,
        },
        DocumentStats {
            total: counts.total_documents,
            completed: counts.completed_documents,
            processing: counts.total_documents.saturating_sub(counts.completed_documents),
        },
        ChatStats {
            total_sessions: counts.total_sessions,
            total_messages: counts.total_messages,
            avg_messages_per_session: average_messages_per_session(
                counts.total_messages,
                counts.total_sessions,
            ),
        },
    )
}

/// Dashboard statistics
pub async fn system_stats(
    db: &Database,
    retrieval: &dyn RetrievalService,
    generation: &dyn GenerationService,
) -> Result<SystemStats> {
    let (users, documents, chat) = summarize(&db.counts()?);

    let rag_ready = retrieval.is_ready();
    let rag = if rag_ready {
        match retrieval.statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Failed to read retrieval statistics: {}", e);
                serde_json::json!({})
            }
        }
    } else {
        serde_json::json!({})
    };

    Ok(SystemStats {
        users,
        documents,
        chat,
        rag,
        services: ServiceStatus {
            ollama: generation.is_connected(),
            rag: rag_ready,
        },
    })
}

/// Newest documents and sessions
pub fn recent_activity(db: &Database) -> Result<RecentActivity> {
    Ok(RecentActivity {
        recent_documents: db
            .recent_documents(RECENT_ACTIVITY_LIMIT)?
            .into_iter()
            .map(RecentDocument::from)
            .collect(),
        recent_sessions: db
            .recent_sessions(RECENT_ACTIVITY_LIMIT)?
            .into_iter()
            .map(RecentSession::from)
            .collect(),
    })
}
