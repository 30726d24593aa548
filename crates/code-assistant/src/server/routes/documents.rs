//! Document upload, listing, status and deletion

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::ingestion::upload::{save_stream, stored_path, validate_extension};
use crate::processing::IngestJob;
use crate::server::routes::parse_id;
use crate::server::state::AppState;
use crate::storage::ProcessingOutcome;
use crate::types::{Document, DocumentStatus};

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct DocumentStatusResponse {
    pub id: Uuid,
    pub status: DocumentStatus,
    pub chunk_count: usize,
}

/// Look up a document visible to the caller; other users' documents are not found
fn owned_document(state: &AppState, id: &str, user: &AuthUser) -> Result<Document> {
    let id = parse_id("Document", id)?;
    state
        .db()
        .get_document(id)?
        .filter(|doc| doc.is_owned_by(user.0.id))
        .ok_or_else(|| Error::not_found("Document", id))
}

/// POST /api/documents/upload - Store a file and queue it for indexing
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Document>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::bad_request("Uploaded file has no name"))?;
        validate_extension(&filename)?;

        let storage = &state.config().storage;
        tokio::fs::create_dir_all(&storage.upload_dir).await?;

        let id = Uuid::new_v4();
        let path = stored_path(&storage.upload_dir, id, &filename);
        let size = save_stream(field, &path, storage.max_upload_bytes()).await?;

        let doc = Document::new_upload(id, filename, path, Some(user.0.id));
        if let Err(e) = state.db().insert_document(&doc) {
            if let Err(cleanup) = tokio::fs::remove_file(&doc.file_path).await {
                tracing::warn!("Failed to remove upload {}: {}", doc.file_path.display(), cleanup);
            }
            return Err(e);
        }

        tracing::info!(
            "Uploaded {} ({} bytes) as document {} for {}",
            doc.filename,
            size,
            doc.id,
            user.0.username
        );

        if let Err(e) = state.job_queue().submit(IngestJob::for_document(&doc)).await {
            tracing::error!("Failed to queue document {}: {}", doc.id, e);
            state.db().finish_processing(doc.id, ProcessingOutcome::Failed)?;
        }

        return Ok(Json(doc));
    }

    Err(Error::bad_request("No file uploaded"))
}

/// GET /api/documents/ - The caller's documents, newest first
pub async fn list_documents(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.db().list_documents_for_owner(user.0.id)?))
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    owned_document(&state, &id, &user).map(Json)
}

/// GET /api/documents/:id/status
pub async fn get_document_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DocumentStatusResponse>> {
    let doc = owned_document(&state, &id, &user)?;
    Ok(Json(DocumentStatusResponse {
        id: doc.id,
        status: doc.status,
        chunk_count: doc.chunk_count,
    }))
}

/// DELETE /api/documents/:id - Remove indexed chunks, stored files and the row
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let doc = owned_document(&state, &id, &user)?;
    let id = doc.id;

    if !state.retrieval().is_ready() {
        tracing::warn!("Refusing to delete document {} while retrieval is unavailable", id);
        return Err(Error::ServiceUnavailable(
            "Document index unavailable, try again later".to_string(),
        ));
    }
    let removed = state.retrieval().delete_document(&id.to_string()).await?;
    tracing::debug!("Removed {} chunks of document {}", removed, id);

    for path in [doc.file_path.clone(), doc.ocr_sidecar_path()] {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    state.db().delete_document(id)?;
    tracing::info!("Deleted document {} ({})", id, doc.filename);

    Ok(Json(json!({ "message": "Document deleted successfully" })))
}
