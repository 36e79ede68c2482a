//! Scene Splitter — cuts extracted document text into paragraph-sized scenes.
//!
//! A scene boundary is the literal `"\n\n"` sequence. Fragments are trimmed and
//! empty ones dropped, so runs of blank lines never produce empty scenes.

use std::fmt;

const SCENE_SEPARATOR: &str = "\n\n";

/// One paragraph of source text; the unit of image generation.
/// Never empty and never carries surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene(String);

impl Scene {
    /// Returns `None` when `text` is blank after trimming.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| Scene(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits `text` into scenes in document order.
pub fn split_into_scenes(text: &str) -> Vec<Scene> {
    text.split(SCENE_SEPARATOR).filter_map(Scene::new).collect()
}
