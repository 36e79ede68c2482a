use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::errors::AppError;

/// Downloads one generated image. Any non-2xx answer is a fetch failure.
pub async fn fetch_image(client: &Client, url: &str) -> Result<Bytes, AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Fetch(format!("GET {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!("GET {url} returned {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Fetch(format!("reading body of {url}: {e}")))?;

    debug!("Fetched {} bytes from {url}", bytes.len());
    Ok(bytes)
}
