//! Upload validation and size-limited streaming to disk

use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::FileKind;

/// Check the upload's extension against the allow-list
pub fn validate_extension(filename: &str) -> Result<FileKind> {
    FileKind::from_path(filename).ok_or_else(|| {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        Error::UnsupportedFileType {
            extension,
            allowed: FileKind::allowed_list(),
        }
    })
}

/// Reduce a client-supplied name to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage location for an upload; the document id prefix keeps names unique
pub fn stored_path(upload_dir: &Path, document_id: Uuid, filename: &str) -> PathBuf {
    upload_dir.join(format!("{}_{}", document_id, sanitize_filename(filename)))
}

/// Stream chunks into `path`, enforcing `max_bytes`.
///
/// On overflow or a read/write error the partial file is removed before the
/// error is returned. Returns the number of bytes written.
pub async fn save_stream<S, B, E>(stream: S, path: &Path, max_bytes: u64) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let result = write_limited(stream, path, max_bytes).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e);
            }
        }
    }
    result
}

async fn write_limited<S, B, E>(stream: S, path: &Path, max_bytes: u64) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);

    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::bad_request(format!("Failed to read upload: {}", e)))?;
        let bytes = chunk.as_ref();

        written += bytes.len() as u64;
        if written > max_bytes {
            return Err(Error::FileTooLarge {
                max_mb: max_bytes / (1024 * 1024),
            });
        }

        file.write_all(bytes).await?;
    }

    file.flush().await?;
    Ok(written)
}
