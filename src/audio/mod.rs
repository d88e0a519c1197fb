//! Audio track extraction and segmentation.
//!
//! The transcription pipeline works on a mono, 16 kHz, 16-bit PCM track
//! extracted from the video, optionally cut into fixed-length chunks.

mod extractor;

pub use extractor::FfmpegAudio;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Sample rate of extracted tracks.
pub const SAMPLE_RATE: u32 = 16_000;

/// Trait for audio extraction backends.
#[async_trait]
pub trait AudioToolkit: Send + Sync {
    /// Extract the PCM track of a video. Returns the existing track without
    /// re-extracting when it is already on disk.
    async fn extract_track(&self, video_path: &Path) -> Result<PathBuf>;

    /// Cut `audio_path` into consecutive chunks of `chunk_seconds` inside
    /// `scratch_dir`. Each chunk's timestamps start at zero. Returned in playback order.
    async fn split_into_chunks(
        &self,
        audio_path: &Path,
        chunk_seconds: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>>;

    /// Measured duration in seconds, or None if it cannot be determined.
    async fn duration(&self, path: &Path) -> Option<f64>;
}

/// Path of the PCM track extracted from `video_path`.
pub fn track_path_for(video_path: &Path) -> PathBuf {
    video_path.with_extension("wav")
}
