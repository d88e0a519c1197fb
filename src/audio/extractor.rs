//! ffmpeg-backed audio extraction and chunking.

use super::{track_path_for, AudioToolkit, SAMPLE_RATE};
use crate::error::{GlimtError, Result};
use crate::ffmpeg;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Chunk file name pattern understood by ffmpeg's segment muxer.
const CHUNK_PATTERN: &str = "chunk_%03d.wav";

/// Audio toolkit using the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Default, Clone)]
pub struct FfmpegAudio;

impl FfmpegAudio {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioToolkit for FfmpegAudio {
    /// Extracts a mono 16 kHz s16le WAV next to the video.
    #[instrument(skip(self), fields(video = %video_path.display()))]
    async fn extract_track(&self, video_path: &Path) -> Result<PathBuf> {
        let target_path = track_path_for(video_path);

        if target_path.exists() {
            info!("Using existing audio track");
            return Ok(target_path);
        }

        info!("Extracting audio track");
        let partial_path = partial_track_path_for(&target_path);
        let sample_rate = SAMPLE_RATE.to_string();
        let args: Vec<OsString> = vec![
            "-i".into(),
            video_path.into(),
            "-vn".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            sample_rate.into(),
            "-ac".into(),
            "1".into(),
            "-f".into(),
            "wav".into(),
            (&partial_path).into(),
        ];

        // Only a completed track is renamed to the path the idempotency check trusts.
        let result = match ffmpeg::run(args).await {
            Ok(()) => std::fs::rename(&partial_path, &target_path).map_err(GlimtError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            remove_partial(&partial_path);
            return Err(GlimtError::AudioExtractionFailed {
                path: video_path.to_path_buf(),
                reason: e.to_string(),
            });
        }

        Ok(target_path)
    }

    #[instrument(skip(self, scratch_dir), fields(audio = %audio_path.display()))]
    async fn split_into_chunks(
        &self,
        audio_path: &Path,
        chunk_seconds: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(scratch_dir)?;

        let pattern = scratch_dir.join(CHUNK_PATTERN);

        let args: Vec<OsString> = vec![
            "-i".into(),
            audio_path.into(),
            "-f".into(),
            "segment".into(),
            "-segment_time".into(),
            chunk_seconds.to_string().into(),
            "-reset_timestamps".into(),
            "1".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            SAMPLE_RATE.to_string().into(),
            "-ac".into(),
            "1".into(),
            pattern.into(),
        ];

        ffmpeg::run(args).await?;

        let chunks = list_chunks(scratch_dir)?;
        info!("Created {} audio chunks", chunks.len());
        Ok(chunks)
    }

    async fn duration(&self, path: &Path) -> Option<f64> {
        match ffmpeg::probe_duration(path).await {
            Ok(d) => Some(d),
            Err(e) => {
                debug!("Could not measure {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Where ffmpeg writes a track before it is complete.
fn partial_track_path_for(target_path: &Path) -> PathBuf {
    let mut name = target_path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove partial track {:?}: {}", path, e);
        }
    }
}

/// Collect the `.wav` files of a scratch directory in name order.
fn list_chunks(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut chunks: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "wav"))
        .collect();
    chunks.sort();
    Ok(chunks)
}
