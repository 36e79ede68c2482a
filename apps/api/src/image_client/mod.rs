/// Image Client — the single point of entry for text-to-image API calls.
///
/// Talks to an OpenAI-compatible `/images/generations` endpoint. One call per
/// scene, exactly one image per call, no retries: a failed call fails the whole
/// storyboard request.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Every scene is rendered at this size.
pub const IMAGE_SIZE: &str = "1024x1024";
const IMAGES_PER_PROMPT: u32 = 1;

#[derive(Debug, Error)]
pub enum ImageApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(String),
}

/// Remote location of one generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
}

/// Text-to-image backend. Carried in `AppState` as `Arc<dyn ImageGenerator>`
/// so the pipeline can be driven without a live API.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageApiError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Generation client for the OpenAI images API (or anything speaking its dialect).
#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiImageClient {
    /// `client` should already carry the outbound timeout.
    pub fn new(client: Client, api_key: String, base_url: &str, model: String) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!("{}/images/generations", base_url.trim_end_matches('/')),
            model,
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageApiError> {
        let request_body = GenerationRequest {
            model: &self.model,
            prompt,
            n: IMAGES_PER_PROMPT,
            size: IMAGE_SIZE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ImageApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let url = first_image_url(&body)?;
        debug!("Image generated: {url}");

        Ok(GeneratedImage { url })
    }
}

/// Pulls `data[0].url` out of a generation response body.
fn first_image_url(body: &str) -> Result<String, ImageApiError> {
    let parsed: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| ImageApiError::UnexpectedPayload(format!("invalid JSON: {e}")))?;

    parsed
        .data
        .into_iter()
        .next()
        .and_then(|d| d.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ImageApiError::UnexpectedPayload("no image url in response".to_string()))
}
