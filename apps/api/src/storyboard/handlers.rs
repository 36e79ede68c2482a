//! Axum route handlers for the storyboard upload flow.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::storyboard::pipeline::create_storyboard;
use crate::storyboard::workspace::{RequestWorkspace, OUTPUT_FILE_NAME};

const UPLOAD_FIELD: &str = "file";

const UPLOAD_FORM: &str = r#"<!doctype html>
<title>Upload PDF</title>
<h1>Upload a PDF to Create a Storyboard</h1>
<form action="/create_storyboard" method="post" enctype="multipart/form-data">
  <input type="file" name="file">
  <input type="submit" value="Upload">
</form>
"#;

/// GET /
pub async fn handle_upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// POST /create_storyboard
///
/// Takes a multipart form with a `file` field holding a PDF and answers with
/// the storyboard PDF as an attachment. The pipeline runs inside a private
/// scratch directory that is removed before this handler returns.
pub async fn handle_create_storyboard(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            warn!("Upload was not a multipart form: {rejection}");
            return Err(AppError::NoFileProvided);
        }
    };

    let workspace = RequestWorkspace::create()?;
    let request_id = workspace.request_id();
    info!(
        "[{request_id}] Storyboard requested for '{}' ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );
    debug!("[{request_id}] Workspace at {}", workspace.path().display());

    let input = workspace.input_path();
    tokio::fs::write(&input, &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("saving upload: {e}")))?;

    let output = workspace.output_path();
    let summary = create_storyboard(
        &input,
        &output,
        state.images.as_ref(),
        &state.http,
        &state.layout,
    )
    .await
    .inspect_err(|e| warn!("[{request_id}] Storyboard failed: {e}"))?;

    let pdf = tokio::fs::read(&output)
        .await
        .map_err(|e| AppError::Assembly(format!("reading back {}: {e}", output.display())))?;
    info!(
        "[{request_id}] Storyboard ready: {} page(s), {} bytes",
        summary.pages,
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{OUTPUT_FILE_NAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[derive(Debug)]
struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Finds the `file` upload. A form with no file part named `file` is
/// "no file uploaded"; a file part whose name was left empty is "no selected file".
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // A plain text field named `file` is not an upload.
        let file_name = match field.file_name() {
            None => continue,
            Some("") => return Err(AppError::NoSelectedFile),
            Some(name) => name.to_string(),
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("reading upload: {e}")))?;

        return Ok(Upload { file_name, bytes });
    }

    Err(AppError::NoFileProvided)
}
