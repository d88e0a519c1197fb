//! Transcription module for Glimt.
//!
//! - `whisper`: speech-to-text over an OpenAI-compatible endpoint
//! - `reassembly`: chunked transcription with global timestamps
//! - `cache`: fingerprinted on-disk transcript cache

pub mod cache;
mod models;
pub mod reassembly;
mod whisper;

pub use cache::{Fingerprint, TranscriptCache};
pub use models::{TranscribeOptions, TranscriptSegment};
pub use reassembly::Reassembler;
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech-to-text services.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe one audio file. Segment timestamps are relative to the file start.
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>>;

    /// Model identifier, part of the transcript cache fingerprint.
    fn model_name(&self) -> &str;
}
