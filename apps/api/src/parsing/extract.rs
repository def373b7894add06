//! Plain-text extraction from uploaded CV files.

use std::path::Path;

use tracing::debug;

use crate::errors::AppError;
use crate::parsing::docx::extract_docx_text;

const SUPPORTED_EXTENSIONS: &str = ".pdf, .docx, .txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvFormat {
    Pdf,
    Docx,
    Txt,
}

impl CvFormat {
    /// Picks the format from the upload's file name, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(CvFormat::Pdf),
            "docx" => Ok(CvFormat::Docx),
            "txt" => Ok(CvFormat::Txt),
            _ => Err(AppError::Validation(format!(
                "Unsupported format. Use: {SUPPORTED_EXTENSIONS}"
            ))),
        }
    }
}

/// Extracts trimmed text. PDF and DOCX decoding run on the blocking pool.
pub async fn extract_cv_text(format: CvFormat, bytes: Vec<u8>) -> Result<String, AppError> {
    let text = match format {
        CvFormat::Txt => String::from_utf8_lossy(&bytes).into_owned(),
        CvFormat::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| AppError::Validation(format!("PDF extraction error: {e}")))
        })
        .await
        .map_err(|e| AppError::Validation(format!("PDF could not be read: {e}")))??,
        CvFormat::Docx => tokio::task::spawn_blocking(move || {
            extract_docx_text(&bytes)
                .map_err(|e| AppError::Validation(format!("DOCX extraction error: {e}")))
        })
        .await
        .map_err(|e| AppError::Validation(format!("DOCX could not be read: {e}")))??,
    };
    let text = text.trim().to_string();
    debug!(?format, chars = text.chars().count(), "Extracted CV text");
    Ok(text)
}
