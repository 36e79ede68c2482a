//! Storyboard Pipeline — orchestrates one request end to end.
//!
//! Flow: extract_text → split_into_scenes → generate (one image per scene) →
//!       fetch every image → assemble pages → save output PDF.
//!
//! Scenes are processed sequentially and in order. Any failure aborts the
//! whole run; the output file is only written after every image is in hand,
//! so a failed run never leaves a partial storyboard behind.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::image_client::{GeneratedImage, ImageGenerator};
use crate::storyboard::assemble::{assemble_storyboard, PageLayout};
use crate::storyboard::extract::extract_text;
use crate::storyboard::fetch::fetch_image;
use crate::storyboard::scenes::{split_into_scenes, Scene};

/// Counts from a successful run. All three are always equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryboardSummary {
    pub scenes: usize,
    pub images: usize,
    pub pages: usize,
}

/// Runs the full pipeline from `input` (a PDF) to `output` (the storyboard PDF).
pub async fn create_storyboard(
    input: &Path,
    output: &Path,
    generator: &dyn ImageGenerator,
    http: &Client,
    layout: &PageLayout,
) -> Result<StoryboardSummary, AppError> {
    let text = extract_text(input).await?;

    let scenes = split_into_scenes(&text);
    info!("Split document into {} scene(s)", scenes.len());
    if scenes.is_empty() {
        return Err(AppError::EmptyDocument);
    }

    let generated = generate_images(&scenes, generator).await?;

    let mut images: Vec<Bytes> = Vec::with_capacity(generated.len());
    for image in &generated {
        images.push(fetch_image(http, &image.url).await?);
    }

    // Decoding and re-encoding every image is CPU-bound.
    let layout = layout.clone();
    let output: PathBuf = output.to_path_buf();
    let scene_count = scenes.len();
    let pages = tokio::task::spawn_blocking(move || {
        assemble_storyboard(&scenes, &images, &layout, &output)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in assembly: {e}")))??;

    info!("Storyboard assembled: {pages} page(s)");
    Ok(StoryboardSummary {
        scenes: scene_count,
        images: generated.len(),
        pages,
    })
}

/// One generation call per scene, in order. Stops at the first failure.
pub async fn generate_images(
    scenes: &[Scene],
    generator: &dyn ImageGenerator,
) -> Result<Vec<GeneratedImage>, AppError> {
    let mut images = Vec::with_capacity(scenes.len());
    for (index, scene) in scenes.iter().enumerate() {
        let image = generator
            .generate(scene.as_str())
            .await
            .map_err(|e| AppError::Generation(format!("scene {}: {e}", index + 1)))?;
        debug!("Scene {} illustrated", index + 1);
        images.push(image);
    }
    Ok(images)
}
