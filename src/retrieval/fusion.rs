//! Evidence fusion: query both modalities and package the hits.

use super::audio::AudioRetriever;
use super::visual::VideoRetriever;
use crate::config::RetrievalSettings;
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// A retrieved keyframe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEvidence {
    pub timestamp_seconds: f64,
    /// `MM:SS`.
    pub timestamp: String,
    pub distance: f32,
    pub image_path: PathBuf,
}

/// A retrieved transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioEvidence {
    pub start_seconds: f64,
    /// `MM:SS`.
    pub timestamp: String,
    pub distance: f32,
    pub text: String,
    /// Shortened text for display.
    pub excerpt: String,
}

/// Hits from both modalities for one query, each list nearest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceBundle {
    pub query: String,
    pub visual: Vec<VisualEvidence>,
    pub audio: Vec<AudioEvidence>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.visual.is_empty() && self.audio.is_empty()
    }

    /// Copy with at most `max_audio` transcript items.
    pub fn for_synthesis(&self, max_audio: usize) -> EvidenceBundle {
        EvidenceBundle {
            query: self.query.clone(),
            visual: self.visual.clone(),
            audio: self.audio.iter().take(max_audio).cloned().collect(),
        }
    }
}

/// Render seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// The first `max_chars` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Issues both searches concurrently and assembles the bundle.
#[derive(Debug, Clone)]
pub struct EvidenceFusion {
    settings: RetrievalSettings,
}

impl EvidenceFusion {
    pub fn new(settings: RetrievalSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Retrieve with the configured `k` per modality.
    pub async fn retrieve(
        &self,
        video: &VideoRetriever,
        audio: &AudioRetriever,
        query: &str,
    ) -> Result<EvidenceBundle> {
        self.retrieve_with(video, audio, query, self.settings.k_visual, self.settings.k_audio)
            .await
    }

    /// Retrieve up to `k_visual` keyframes and `k_audio` segments.
    ///
    /// A modality whose index is empty contributes an empty list.
    #[instrument(skip(self, video, audio))]
    pub async fn retrieve_with(
        &self,
        video: &VideoRetriever,
        audio: &AudioRetriever,
        query: &str,
        k_visual: usize,
        k_audio: usize,
    ) -> Result<EvidenceBundle> {
        let (visual_hits, audio_hits) =
            futures::join!(video.search(query, k_visual), audio.search(query, k_audio));
        let (visual_hits, audio_hits) = (visual_hits?, audio_hits?);

        debug!(
            "Retrieved {} keyframes and {} segments",
            visual_hits.len(),
            audio_hits.len()
        );

        Ok(EvidenceBundle {
            query: query.to_string(),
            visual: visual_hits
                .into_iter()
                .map(|h| VisualEvidence {
                    timestamp: format_timestamp(h.timestamp),
                    timestamp_seconds: h.timestamp,
                    distance: h.distance,
                    image_path: h.path,
                })
                .collect(),
            audio: audio_hits
                .into_iter()
                .map(|h| AudioEvidence {
                    timestamp: format_timestamp(h.start_seconds),
                    start_seconds: h.start_seconds,
                    distance: h.distance,
                    excerpt: excerpt(&h.text, self.settings.excerpt_chars),
                    text: h.text,
                })
                .collect(),
        })
    }
}
