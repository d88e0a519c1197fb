//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A single segment of a transcript with timestamp information.
///
/// Serialized as `{"start", "end", "text"}`, the shape stored in the transcript cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    #[serde(rename = "start")]
    pub start_seconds: f64,
    /// End time in seconds.
    #[serde(rename = "end")]
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Copy of this segment moved later by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start_seconds: self.start_seconds + offset,
            end_seconds: self.end_seconds + offset,
            text: self.text.clone(),
        }
    }
}

/// Decoding options handed to the speech-to-text backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeOptions {
    pub beam_size: u32,
    pub temperature: f32,
    /// Language hint; None lets the model detect it.
    pub language: Option<String>,
    /// Half-precision inference, where the backend supports it.
    pub half_precision: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            beam_size: 1,
            temperature: 0.0,
            language: None,
            half_precision: true,
        }
    }
}
