//! CLIP embeddings served over HTTP.
//!
//! Talks to a small encoding service exposing:
//! - `POST {endpoint}/encode/images` with `{"model", "images": [base64 PNG]}`
//! - `POST {endpoint}/encode/text` with `{"model", "texts": [..]}`
//!
//! Both answer `{"embeddings": [[f32; D], ..]}` in request order.

use super::ImageEmbedder;
use crate::error::{GlimtError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    images: Vec<String>,
}

#[derive(Serialize)]
struct TextRequest<'a> {
    model: &'a str,
    texts: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EncodeResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP client for a CLIP encoding service.
pub struct ClipEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl ClipEmbedder {
    /// Create a new CLIP embedder.
    pub fn new(endpoint: &str, model: &str, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T, expected: usize) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.endpoint, path);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GlimtError::Embedding(format!(
                "CLIP service returned {} for {}: {}",
                status, url, text
            )));
        }

        let parsed: EncodeResponse = response.json().await?;

        if parsed.embeddings.len() != expected {
            return Err(GlimtError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                parsed.embeddings.len()
            )));
        }
        if let Some(bad) = parsed.embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(GlimtError::Embedding(format!(
                "Expected {}-d embeddings, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

/// Encode an image as base64 PNG for the wire.
fn encode_png(image: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

#[async_trait]
impl ImageEmbedder for ClipEmbedder {
    #[instrument(skip(self, images), fields(count = images.len()))]
    async fn embed_images(&self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = images.iter().map(encode_png).collect::<Result<Vec<_>>>()?;
        debug!("Encoding {} keyframes with {}", images.len(), self.model);

        let request = ImageRequest {
            model: &self.model,
            images: encoded,
        };
        self.post("/encode/images", &request, images.len()).await
    }

    #[instrument(skip(self, text))]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let request = TextRequest {
            model: &self.model,
            texts: vec![text],
        };
        self.post("/encode/text", &request, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GlimtError::Embedding("Empty embedding response".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
