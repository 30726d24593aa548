//! Chat query, session and code generation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::auth::MaybeAuthUser;
use crate::chat::{ChatRequest, ChatResponse};
use crate::error::{Error, Result};
use crate::server::routes::parse_id;
use crate::server::state::AppState;
use crate::types::{Message, SessionSummary};

/// Sessions returned by the listing endpoint
const SESSION_LIST_LIMIT: usize = 20;

/// Code generation request
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub language: String,
}

/// POST /api/chat/query - Answer a question, optionally grounded on documents
pub async fn chat_query(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let response = state.chat().ask(request, user.map(|u| u.id)).await?;
    Ok(Json(response))
}

/// GET /api/chat/sessions - Newest sessions with message counts
pub async fn list_sessions(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<Vec<SessionSummary>>> {
    let sessions = state
        .db()
        .list_sessions(user.map(|u| u.id), SESSION_LIST_LIMIT)?;
    Ok(Json(sessions))
}

/// GET /api/chat/sessions/:id/messages - Messages in chronological order
pub async fn session_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    let id = parse_id("Session", &id)?;
    if state.db().get_session(id)?.is_none() {
        return Err(Error::not_found("Session", id));
    }
    Ok(Json(state.db().list_messages(id)?))
}

/// DELETE /api/chat/sessions/:id - Remove a session and its messages
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = parse_id("Session", &id)?;
    if !state.db().delete_session(id)? {
        return Err(Error::not_found("Session", id));
    }
    tracing::info!("Deleted session {}", id);
    Ok(Json(json!({ "message": "Session deleted" })))
}

/// POST /api/chat/code/generate - Generate a code snippet
pub async fn generate_code(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<CodeResponse>> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(Error::bad_request("Description must not be empty"));
    }

    let code = state
        .generation()
        .generate_code(description, &request.language)
        .await
        .map_err(|e| Error::ServiceUnavailable(format!("Language model unavailable: {}", e)))?;

    Ok(Json(CodeResponse {
        code,
        language: request.language,
    }))
}
