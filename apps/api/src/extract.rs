//! Best-effort PDF text extraction for preview snippets.
//!
//! Extraction never decides policy: it returns `Result` and the caller picks
//! [`EXTRACTION_FALLBACK`] when it wants a placeholder instead of an error.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Shown in place of a preview when a PDF cannot be parsed.
pub const EXTRACTION_FALLBACK: &str = "Unable to extract text from PDF";
pub const PREVIEW_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF parser panicked")]
    Panicked,
}

/// Extracts the text of every page, in page order.
///
/// Blocking. Call from `spawn_blocking` (see [`extract_preview`]).
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // pdf-extract panics on some malformed inputs instead of returning Err.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(&bytes)
    }));

    match outcome {
        Ok(Ok(text)) => {
            debug!("Extracted {} chars from {}", text.len(), path.display());
            Ok(text)
        }
        Ok(Err(e)) => Err(ExtractionError::Parse(e.to_string())),
        Err(_) => Err(ExtractionError::Panicked),
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, plus `...` when anything was cut.
pub fn preview_snippet(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Preview text for a stored PDF, falling back to [`EXTRACTION_FALLBACK`] on any failure.
pub async fn extract_preview(path: PathBuf) -> String {
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || extract_text(&path)).await {
        Ok(Ok(text)) => preview_snippet(&text),
        Ok(Err(e)) => {
            warn!("Error extracting PDF text from {shown}: {e}");
            EXTRACTION_FALLBACK.to_string()
        }
        Err(e) => {
            warn!("PDF extraction task for {shown} failed: {e}");
            EXTRACTION_FALLBACK.to_string()
        }
    }
}
