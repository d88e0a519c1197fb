//! Video decoding and keyframe selection.
//!
//! Frames are sampled at a fixed stride of the native frame rate, compared
//! against the last accepted keyframe with a hue-histogram shot detector, and
//! the distinct ones are persisted and embedded in batches.

mod decoder;
pub mod keyframes;
pub mod shot;

pub use decoder::FfmpegDecoder;
pub use keyframes::{ExtractionStats, KeyframeExtractor, KeyframeOptions};
pub use shot::ShotDetector;

use crate::error::Result;
use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Stream properties needed for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Native frames per second.
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Container duration, when known.
    pub duration_seconds: Option<f64>,
}

impl VideoInfo {
    /// A stream is usable when it has a positive, finite frame rate and a picture.
    pub fn is_decodable(&self) -> bool {
        self.fps.is_finite() && self.fps > 0.0 && self.width > 0 && self.height > 0
    }
}

/// Sequential reader over sampled frames.
#[async_trait]
pub trait FrameReader: Send {
    /// The next sampled frame, or None at the end of the stream.
    async fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Trait for video decoding backends.
#[async_trait]
pub trait VideoDecoder: Send + Sync {
    /// Read stream properties.
    async fn probe(&self, path: &Path) -> Result<VideoInfo>;

    /// Open a reader yielding native frames `0, step, 2*step, ...`.
    async fn open(&self, path: &Path, info: &VideoInfo, step: u64) -> Result<Box<dyn FrameReader>>;

    /// Re-encode into a widely supported codec and return the new file.
    async fn transcode(&self, path: &Path) -> Result<PathBuf>;
}
