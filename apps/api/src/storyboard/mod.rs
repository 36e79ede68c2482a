// Storyboard pipeline: PDF text → scenes → one generated image per scene → PDF.
// Each request runs in its own scratch directory; nothing outlives the response.

pub mod assemble;
pub mod extract;
pub mod fetch;
pub mod handlers;
pub mod pipeline;
pub mod scenes;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the public API consumed by main and the router.
pub use assemble::{default_page_layout, PageLayout};
