mod config;
mod errors;
mod image_client;
mod routes;
mod state;
mod storyboard;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::image_client::{OpenAiImageClient, IMAGE_SIZE};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storyboard::default_page_layout;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API credential)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Storyboard API v{}", env!("CARGO_PKG_VERSION"));

    // One outbound client for the image API and image downloads
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let images = OpenAiImageClient::new(
        http.clone(),
        config.openai_api_key.clone(),
        &config.image_api_base_url,
        config.image_model.clone(),
    );
    info!(
        "Image client initialized (model: {}, size: {IMAGE_SIZE}, endpoint: {})",
        config.image_model, config.image_api_base_url
    );

    let layout = default_page_layout();
    info!(
        "Page layout: {}x{}pt, caption {}pt",
        layout.page_width, layout.page_height, layout.font_size
    );

    let state = AppState {
        images: Arc::new(images),
        http,
        layout,
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
