//! Visual retrieval: keyframe records and their vector index.

use crate::embedding::ImageEmbedder;
use crate::error::{GlimtError, Result};
use crate::vector_store::{l2_normalize, FlatIndex, VectorIndex};
use crate::video::{ExtractionStats, KeyframeExtractor, KeyframeOptions, VideoDecoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// One indexed keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeRecord {
    /// Position in the index.
    pub id: usize,
    pub timestamp: f64,
    pub path: PathBuf,
    /// Unit-norm embedding.
    pub embedding: Vec<f32>,
}

/// A keyframe search result.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualHit {
    pub timestamp: f64,
    pub distance: f32,
    pub path: PathBuf,
}

/// Keyframe embeddings with their records, addressed by id.
pub struct VisualIndex {
    embedder: Arc<dyn ImageEmbedder>,
    index: Box<dyn VectorIndex>,
    records: Vec<KeyframeRecord>,
}

impl VisualIndex {
    /// Empty exact index sized to the embedder.
    pub fn new(embedder: Arc<dyn ImageEmbedder>) -> Self {
        let index = Box::new(FlatIndex::new(embedder.dimensions()));
        Self {
            embedder,
            index,
            records: Vec::new(),
        }
    }

    /// Append keyframes. `frames[i]` is the `(timestamp, path)` of `embeddings[i]`.
    pub fn add(&mut self, mut embeddings: Vec<Vec<f32>>, frames: Vec<(f64, PathBuf)>) -> Result<()> {
        if embeddings.len() != frames.len() {
            return Err(GlimtError::VectorIndex(format!(
                "{} embeddings for {} keyframes",
                embeddings.len(),
                frames.len()
            )));
        }

        for embedding in embeddings.iter_mut() {
            l2_normalize(embedding);
        }
        self.index.add(&embeddings)?;

        let first_id = self.records.len();
        self.records.extend(embeddings.into_iter().zip(frames).enumerate().map(
            |(i, (embedding, (timestamp, path)))| KeyframeRecord {
                id: first_id + i,
                timestamp,
                path,
                embedding,
            },
        ));
        Ok(())
    }

    /// Keyframes closest to a text query, nearest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<VisualHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut embedding = self.embedder.embed_text(query).await?;
        l2_normalize(&mut embedding);

        let neighbors = self.index.search(&embedding, k)?;
        Ok(neighbors
            .into_iter()
            .filter_map(|n| {
                self.records.get(n.id).map(|r| VisualHit {
                    timestamp: r.timestamp,
                    distance: n.distance,
                    path: r.path.clone(),
                })
            })
            .collect())
    }

    pub fn reset(&mut self) {
        self.index.reset();
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[KeyframeRecord] {
        &self.records
    }
}

/// Builds and searches the keyframe index of a single video.
pub struct VideoRetriever {
    extractor: KeyframeExtractor,
    index: VisualIndex,
}

impl VideoRetriever {
    /// Create a retriever. Clears `keyframe_dir`.
    pub fn new(
        decoder: Arc<dyn VideoDecoder>,
        embedder: Arc<dyn ImageEmbedder>,
        keyframe_dir: impl Into<PathBuf>,
        batch_size: usize,
    ) -> Result<Self> {
        let extractor = KeyframeExtractor::new(decoder, embedder.clone(), keyframe_dir, batch_size);
        extractor.clear_keyframe_dir()?;

        Ok(Self {
            extractor,
            index: VisualIndex::new(embedder),
        })
    }

    /// Rebuild the index from the keyframes of `video_path`.
    #[instrument(skip(self, options), fields(video = %video_path.display()))]
    pub async fn process_video(
        &mut self,
        video_path: &Path,
        options: &KeyframeOptions,
    ) -> Result<ExtractionStats> {
        self.index.reset();
        self.extractor.clear_keyframe_dir()?;

        let stats = self
            .extractor
            .extract(video_path, options, &mut self.index)
            .await?;

        if self.index.is_empty() {
            return Err(GlimtError::EmptyIndex(format!(
                "no keyframes extracted from {}",
                video_path.display()
            )));
        }

        info!("Visual index ready with {} keyframes", self.index.len());
        Ok(stats)
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<VisualHit>> {
        self.index.search(query, k).await
    }

    pub fn reset(&mut self) {
        self.index.reset();
    }

    pub fn index(&self) -> &VisualIndex {
        &self.index
    }

    pub fn keyframe_dir(&self) -> &Path {
        self.extractor.keyframe_dir()
    }
}
