//! PDF → resume text.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Extracts plain text from an uploaded PDF.
///
/// `pdf_extract` is synchronous and panics on some malformed files, so it runs
/// on the blocking pool and a panic is reported like any other unreadable PDF.
pub async fn extract_text(pdf: Bytes) -> Result<String, AppError> {
    let size = pdf.len();
    let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf)).await;

    let text = match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("PDF extraction failed ({size} bytes): {e}");
            return Err(AppError::UnprocessableEntity(format!(
                "Failed to extract text from PDF: {e}"
            )));
        }
        Err(e) if e.is_panic() => {
            warn!("PDF extractor panicked ({size} bytes)");
            return Err(AppError::UnprocessableEntity(
                "The PDF file could not be read.".to_string(),
            ));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the PDF.".to_string(),
        ));
    }

    debug!("Extracted {} chars from {size}-byte PDF", text.chars().count());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_garbage_bytes_are_unprocessable() {
        let result = extract_text(Bytes::from_static(b"definitely not a pdf")).await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[tokio::test]
    async fn test_empty_upload_is_unprocessable() {
        let result = extract_text(Bytes::new()).await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }
}
