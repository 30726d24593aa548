//! OCR engine trait and the tesseract CLI implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Trait for recovering text from images
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract text from the image at `image_path`
    async fn extract_text(&self, image_path: &Path) -> Result<String>;
}

/// OCR through the `tesseract` command line tool
pub struct TesseractOcr {
    language: String,
}

impl TesseractOcr {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Check if tesseract is installed
    pub fn is_available() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(image_path: PathBuf, language: String) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(&image_path)
            .args(["stdout", "-l", &language])
            .output()
            .map_err(|e| {
                Error::Ocr(format!(
                    "Failed to run tesseract (install with: apt install tesseract-ocr): {}",
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!(
                "tesseract failed on {}: {}",
                image_path.display(),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::info!(
            "OCR extracted {} characters from {}",
            text.len(),
            image_path.display()
        );
        Ok(text)
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, image_path: &Path) -> Result<String> {
        let path = image_path.to_path_buf();
        let language = self.language.clone();
        tokio::task::spawn_blocking(move || Self::run(path, language)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_image_is_an_ocr_error() {
        if !TesseractOcr::is_available() {
            return;
        }
        let ocr = TesseractOcr::default();
        let result = ocr
            .extract_text(Path::new("/nonexistent/definitely-missing.png"))
            .await;
        assert!(matches!(result, Err(Error::Ocr(_))));
    }
}
