//! Document text extraction: PDF, DOCX and scanned images.
//!
//! Parsing is CPU-bound and runs on the blocking pool; OCR shells out to
//! the `tesseract` binary.

pub mod docx;
pub mod ocr;

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use ocr::OcrConfig;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("failed to read DOCX: {0}")]
    Docx(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("no text could be extracted from the document")]
    EmptyDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Image,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

impl DocumentKind {
    /// Resolves the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self, ExtractionError> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            e if IMAGE_EXTENSIONS.contains(&e) => Ok(DocumentKind::Image),
            _ => Err(ExtractionError::UnsupportedFormat(format!(".{ext}"))),
        }
    }

    /// Resolves the kind from a file name. Names without an extension are
    /// unsupported here; use [`DocumentKind::sniff`] on the content instead.
    pub fn from_filename(name: &str) -> Result<Self, ExtractionError> {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Err(ExtractionError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Detects the kind from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const SIGNATURES: &[(&[u8], DocumentKind)] = &[
            (b"%PDF", DocumentKind::Pdf),
            (b"PK\x03\x04", DocumentKind::Docx),
            (b"\x89PNG\r\n\x1a\n", DocumentKind::Image),
            (b"\xff\xd8\xff", DocumentKind::Image),
            (b"GIF87a", DocumentKind::Image),
            (b"GIF89a", DocumentKind::Image),
            (b"II*\x00", DocumentKind::Image),
            (b"MM\x00*", DocumentKind::Image),
            (b"BM", DocumentKind::Image),
        ];

        if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(DocumentKind::Image);
        }
        SIGNATURES
            .iter()
            .find(|(magic, _)| bytes.starts_with(magic))
            .map(|(_, kind)| *kind)
    }
}

/// Extracts plain text from a document of the given kind.
pub async fn extract_text(
    bytes: Bytes,
    kind: DocumentKind,
    ocr: &OcrConfig,
) -> Result<String, ExtractionError> {
    let size = bytes.len();
    let text = match kind {
        DocumentKind::Pdf => {
            run_blocking(kind, move || {
                pdf_extract::extract_text_from_mem(&bytes)
                    .map_err(|e| ExtractionError::Pdf(e.to_string()))
            })
            .await?
        }
        DocumentKind::Docx => run_blocking(kind, move || docx::extract_text(&bytes)).await?,
        DocumentKind::Image => ocr::recognize(&bytes, ocr).await?,
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    debug!(?kind, bytes = size, chars = text.len(), "Extracted document text");
    Ok(text)
}

async fn run_blocking<F>(kind: DocumentKind, f: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError> + Send + 'static,
{
    // pdf-extract panics on some malformed inputs; the JoinError carries it.
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        let msg = format!("extraction task failed: {e}");
        match kind {
            DocumentKind::Docx => ExtractionError::Docx(msg),
            _ => ExtractionError::Pdf(msg),
        }
    })?
}
