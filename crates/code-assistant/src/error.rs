//! Error types for the code assistant

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for code assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Code assistant errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or invalid request
    #[error("{0}")]
    BadRequest(String),

    /// Upload with an extension outside the allow-list
    #[error("File type not supported. Allowed: {allowed}")]
    UnsupportedFileType { extension: String, allowed: String },

    /// Upload larger than the configured maximum
    #[error("File too large. Max size: {max_mb}MB")]
    FileTooLarge { max_mb: u64 },

    /// Missing, expired or forged credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Unique constraint violated (email, username)
    #[error("{0}")]
    Conflict(String),

    /// Entity not found (or not visible to the caller)
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: String },

    /// Text extraction failed
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// OCR extraction failed
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Retrieval index error
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Ollama/LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A collaborator could not serve the request
    #[error("{0}")]
    ServiceUnavailable(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not-found error for the given entity kind
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::UnsupportedFileType { .. } => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::FileTooLarge { .. } => (StatusCode::BAD_REQUEST, "file_too_large"),
            Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Error::FileParse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "parse_error"),
            Error::Ocr(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ocr_error"),
            Error::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error"),
            Error::Retrieval(_) => (StatusCode::INTERNAL_SERVER_ERROR, "retrieval_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("{} ({})", self, error_type);
        }

        let body = Json(json!({
            "detail": self.to_string(),
            "error": error_type,
        }));

        (status, body).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Error::BadRequest(format!("Failed to read multipart body: {}", err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        let unsupported = Error::UnsupportedFileType {
            extension: ".exe".to_string(),
            allowed: ".pdf, .txt".to_string(),
        };
        assert_eq!(unsupported.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(
            unsupported.to_string(),
            "File type not supported. Allowed: .pdf, .txt"
        );

        let missing = Error::not_found("Session", "abc");
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Session not found");

        let too_large = Error::FileTooLarge { max_mb: 10 };
        assert_eq!(too_large.to_string(), "File too large. Max size: 10MB");
    }

    #[test]
    fn test_generation_failure_is_service_unavailable() {
        let err = Error::ServiceUnavailable("model offline".to_string());
        assert_eq!(err.status_and_code(), (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"));
    }
}
