//! Text Extractor — reads every page of a PDF into one string.
//!
//! `pdf-extract` is synchronous and CPU-bound, so extraction runs inside
//! `tokio::task::spawn_blocking`. The library can panic on malformed input;
//! the join error from such a panic is reported as a read failure.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::AppError;

/// Extracts the text of all pages in page order.
pub async fn extract_text(path: &Path) -> Result<String, AppError> {
    let path: PathBuf = path.to_path_buf();

    if !path.is_file() {
        return Err(AppError::DocumentRead(format!(
            "{} does not exist",
            path.display()
        )));
    }

    let path_label = path.display().to_string();
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&path).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| AppError::DocumentRead(format!("extraction of {path_label} aborted: {e}")))?
    .map_err(|e| AppError::DocumentRead(format!("{path_label}: {e}")))?;

    debug!("Extracted {} chars from {path_label}", text.len());
    Ok(text)
}
