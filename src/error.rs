//! Error types for Glimt.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Glimt operations.
#[derive(Error, Debug)]
pub enum GlimtError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The video (or its audio) could not be decoded, even after one transcode attempt.
    #[error("Media unreadable: {}: {reason}", path.display())]
    MediaUnreadable { path: PathBuf, reason: String },

    /// The PCM track could not be produced. Fatal to the audio pipeline only.
    #[error("Audio extraction failed for {}: {reason}", path.display())]
    AudioExtractionFailed { path: PathBuf, reason: String },

    /// A build finished without a single vector to search.
    #[error("Empty index: {0}")]
    EmptyIndex(String),

    /// Transcript cache read/write failure. Callers treat this as a cache miss.
    #[error("Transcript cache error at {}: {reason}", path.display())]
    CacheIo { path: PathBuf, reason: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GlimtError {
    /// Whether this error should be shown to the user as a failed build.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            GlimtError::MediaUnreadable { .. } | GlimtError::EmptyIndex(_)
        )
    }
}

/// Result type alias for Glimt operations.
pub type Result<T> = std::result::Result<T, GlimtError>;
