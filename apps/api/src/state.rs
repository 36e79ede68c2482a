use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::image_client::ImageGenerator;
use crate::storyboard::PageLayout;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable generation backend. Default: OpenAiImageClient.
    pub images: Arc<dyn ImageGenerator>,
    /// Outbound client for downloading generated images; carries the configured timeout.
    pub http: Client,
    /// Page geometry shared by every storyboard page.
    pub layout: PageLayout,
}
