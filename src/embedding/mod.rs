//! Embedding generation for both retrieval spaces.
//!
//! - The visual space pairs images with text (CLIP-style, 512-d by default).
//! - The audio space embeds transcript text only (384-d by default).
//!
//! Implementations are loaded once and shared for the process lifetime.

mod clip;
mod openai;

pub use clip::ClipEmbedder;
pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;
use image::RgbImage;

/// Text embedder for the transcript space.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Joint image/text embedder for the keyframe space.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Embed a batch of images, in input order. Identical pixels give identical vectors.
    async fn embed_images(&self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>>;

    /// Embed a text query into the same space as the images.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}
