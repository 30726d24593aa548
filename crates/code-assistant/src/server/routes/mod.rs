//! API routes

pub mod admin;
pub mod auth;
pub mod chat;
pub mod documents;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Multipart framing allowance on top of the upload size limit
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Parse an id taken from the path; malformed ids are reported as not found
pub(crate) fn parse_id(kind: &'static str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::not_found(kind, raw))
}

/// Build all API routes, mounted under `/api`
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    let upload_limit = max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Chat
        .route("/chat/query", post(chat::chat_query))
        .route("/chat/sessions", get(chat::list_sessions))
        .route("/chat/sessions/:id", delete(chat::delete_session))
        .route("/chat/sessions/:id/messages", get(chat::session_messages))
        .route("/chat/code/generate", post(chat::generate_code))
        // Documents
        .route(
            "/documents/upload",
            post(documents::upload_document).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/documents", get(documents::list_documents))
        .route("/documents/", get(documents::list_documents))
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/status", get(documents::get_document_status))
        // Admin
        .route("/admin/stats", get(admin::stats))
        .route("/admin/recent-activity", get(admin::recent_activity))
}
