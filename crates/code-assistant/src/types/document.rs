//! Uploaded document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extensions accepted for upload, lowercase with the leading dot
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".txt", ".md", ".docx", ".png", ".jpg", ".jpeg", ".bmp", ".tiff",
];

/// Supported upload kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Microsoft Word document (.docx)
    Docx,
    /// Image, text is recovered with OCR
    Image,
}

impl FileKind {
    /// Detect the kind from an extension (with or without the dot, any case)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Markdown),
            "docx" => Some(Self::Docx),
            "png" | "jpg" | "jpeg" | "bmp" | "tiff" => Some(Self::Image),
            _ => None,
        }
    }

    /// Detect the kind from a file name or path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether text must be recovered through OCR
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image)
    }

    /// Comma separated allow-list for error messages
    pub fn allowed_list() -> String {
        ALLOWED_EXTENSIONS.join(", ")
    }
}

/// OCR output for an image is stored next to it with a `.txt` suffix
pub fn ocr_sidecar_path(file_path: &Path) -> PathBuf {
    let mut path = file_path.as_os_str().to_owned();
    path.push(".txt");
    PathBuf::from(path)
}

/// Processing status of an uploaded document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a stored status; unknown values read as pending
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Completed and failed documents never change status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    /// Original file name as uploaded
    pub filename: String,
    /// Where the upload is stored on disk
    #[serde(skip_serializing)]
    pub file_path: PathBuf,
    #[serde(skip_serializing)]
    pub owner_id: Option<Uuid>,
    pub chunk_count: usize,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// A freshly uploaded document, queued for processing
    pub fn new_upload(id: Uuid, filename: String, file_path: PathBuf, owner_id: Option<Uuid>) -> Self {
        Self {
            id,
            title: filename.clone(),
            filename,
            file_path,
            owner_id,
            chunk_count: 0,
            status: DocumentStatus::Processing,
            uploaded_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_path(&self.filename)
    }

    /// Sidecar file receiving OCR text for image uploads
    pub fn ocr_sidecar_path(&self) -> PathBuf {
        ocr_sidecar_path(&self.file_path)
    }

    /// Whether the given user may see and modify this document
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection_is_case_insensitive() {
        assert_eq!(FileKind::from_path("notes.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path("scan.Jpeg"), Some(FileKind::Image));
        assert_eq!(FileKind::from_extension(".md"), Some(FileKind::Markdown));
        assert_eq!(FileKind::from_path("virus.exe"), None);
        assert_eq!(FileKind::from_path("README"), None);
    }

    #[test]
    fn test_allowed_extensions_match_kinds() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(FileKind::from_extension(ext).is_some(), "{ext} should be accepted");
        }
    }

    #[test]
    fn test_ocr_sidecar_path() {
        let doc = Document::new_upload(
            Uuid::new_v4(),
            "diagram.png".to_string(),
            PathBuf::from("uploads/abc_diagram.png"),
            None,
        );
        assert_eq!(doc.ocr_sidecar_path(), PathBuf::from("uploads/abc_diagram.png.txt"));
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert_eq!(doc.title, "diagram.png");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DocumentStatus::Pending,
            DocumentStatus::Processing,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            assert_eq!(DocumentStatus::parse(status.as_str()), status);
        }
        assert!(DocumentStatus::Failed.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
    }
}
