use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFileProvided,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document has no scenes to illustrate")]
    EmptyDocument,

    #[error("Document read error: {0}")]
    DocumentRead(String),

    #[error("Image generation error: {0}")]
    Generation(String),

    #[error("Image fetch error: {0}")]
    Fetch(String),

    #[error("Storyboard assembly error: {0}")]
    Assembly(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Upload problems answer with the bare message, matching the form workflow.
            AppError::NoFileProvided | AppError::NoSelectedFile => {
                return (
                    StatusCode::BAD_REQUEST,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    self.to_string(),
                )
                    .into_response();
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::EmptyDocument => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_DOCUMENT",
                "No scenes were found in the uploaded document".to_string(),
            ),
            AppError::DocumentRead(msg) => {
                tracing::error!("Document read error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOCUMENT_READ_ERROR",
                    "The uploaded document could not be read".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Image generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "An image generation error occurred".to_string(),
                )
            }
            AppError::Fetch(msg) => {
                tracing::error!("Image fetch error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "FETCH_ERROR",
                    "A generated image could not be downloaded".to_string(),
                )
            }
            AppError::Assembly(msg) => {
                tracing::error!("Storyboard assembly error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ASSEMBLY_ERROR",
                    "The storyboard could not be assembled".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
