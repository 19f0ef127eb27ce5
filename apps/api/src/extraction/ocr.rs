use std::io::Write;

use tokio::process::Command;
use tracing::{debug, warn};

use super::ExtractionError;

/// Settings for the external `tesseract` OCR engine.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub binary: String,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

/// Runs OCR over an image held in memory.
///
/// tesseract reads from a path, so the bytes are spilled to a temp file that
/// is removed when this returns.
pub async fn recognize(image: &[u8], config: &OcrConfig) -> Result<String, ExtractionError> {
    let mut file = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractionError::Ocr(format!("failed to create temp file: {e}")))?;
    file.write_all(image)
        .and_then(|_| file.flush())
        .map_err(|e| ExtractionError::Ocr(format!("failed to write temp file: {e}")))?;

    debug!(binary = %config.binary, lang = %config.language, "Running OCR");

    let output = Command::new(&config.binary)
        .arg(file.path())
        .arg("stdout")
        .arg("-l")
        .arg(&config.language)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ExtractionError::Ocr(format!("could not run '{}': {e}", config.binary)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(status = %output.status, "tesseract exited with an error");
        return Err(ExtractionError::Ocr(format!(
            "tesseract exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_ocr_error() {
        let config = OcrConfig {
            binary: "/nonexistent/tesseract-binary".to_string(),
            language: "eng".to_string(),
        };
        let err = recognize(b"\x89PNG\r\n\x1a\n", &config).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Ocr(msg) if msg.contains("could not run")));
    }

    #[test]
    fn test_default_config() {
        let config = OcrConfig::default();
        assert_eq!(config.binary, "tesseract");
        assert_eq!(config.language, "eng");
    }
}
