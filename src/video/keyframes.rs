//! Keyframe extraction: sample, detect shots, persist, embed.

use super::{FrameReader, ShotDetector, VideoDecoder, VideoInfo};
use crate::embedding::ImageEmbedder;
use crate::error::{GlimtError, Result};
use crate::retrieval::visual::VisualIndex;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Frame stride used when the sample rate is not positive.
pub const FALLBACK_STEP: u64 = 30;
/// Keyframes embedded per request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Sampling parameters for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeOptions {
    /// Frames sampled per second of video.
    pub sample_rate: f64,
    /// Shot detector threshold.
    pub diff_threshold: f64,
    /// Stop sampling past this many minutes.
    pub max_duration_minutes: Option<f64>,
}

impl Default for KeyframeOptions {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            diff_threshold: super::shot::DEFAULT_THRESHOLD,
            max_duration_minutes: None,
        }
    }
}

/// Counters from one extraction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub frames_sampled: usize,
    pub keyframes: usize,
    /// Whether the source had to be transcoded before it could be read.
    pub transcoded: bool,
}

/// Native-frame stride for a sampling rate.
pub fn sampling_step(fps: f64, sample_rate: f64) -> u64 {
    if sample_rate <= 0.0 {
        return FALLBACK_STEP;
    }
    ((fps / sample_rate).floor() as u64).max(1)
}

/// File name of the `n`th keyframe.
pub fn keyframe_file_name(n: usize) -> String {
    format!("frame_{n:05}.jpg")
}

/// Keyframes waiting to be embedded.
#[derive(Default)]
struct PendingBatch {
    images: Vec<RgbImage>,
    frames: Vec<(f64, PathBuf)>,
}

impl PendingBatch {
    fn len(&self) -> usize {
        self.images.len()
    }
}

/// Turns a video into embedded keyframes.
pub struct KeyframeExtractor {
    decoder: Arc<dyn VideoDecoder>,
    embedder: Arc<dyn ImageEmbedder>,
    keyframe_dir: PathBuf,
    batch_size: usize,
}

impl KeyframeExtractor {
    pub fn new(
        decoder: Arc<dyn VideoDecoder>,
        embedder: Arc<dyn ImageEmbedder>,
        keyframe_dir: impl Into<PathBuf>,
        batch_size: usize,
    ) -> Self {
        Self {
            decoder,
            embedder,
            keyframe_dir: keyframe_dir.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn keyframe_dir(&self) -> &Path {
        &self.keyframe_dir
    }

    /// Delete and recreate the keyframe directory.
    pub fn clear_keyframe_dir(&self) -> Result<()> {
        if self.keyframe_dir.exists() {
            std::fs::remove_dir_all(&self.keyframe_dir)?;
        }
        std::fs::create_dir_all(&self.keyframe_dir)?;
        Ok(())
    }

    /// Sample `video_path`, keep shot changes, and append their embeddings to `index`.
    ///
    /// The index is not reset here. Keyframe files are numbered from the
    /// current index length.
    #[instrument(skip(self, options, index), fields(video = %video_path.display()))]
    pub async fn extract(
        &self,
        video_path: &Path,
        options: &KeyframeOptions,
        index: &mut VisualIndex,
    ) -> Result<ExtractionStats> {
        let (info, mut reader, transcoded) = self.open_readable(video_path, options).await?;
        let step = sampling_step(info.fps, options.sample_rate);
        let max_seconds = options.max_duration_minutes.map(|m| m * 60.0);

        info!(
            "Sampling every {} frames ({:.2} fps source, threshold {})",
            step, info.fps, options.diff_threshold
        );

        let mut detector = ShotDetector::new(options.diff_threshold);
        let mut pending = PendingBatch::default();
        let mut stats = ExtractionStats {
            transcoded,
            ..Default::default()
        };
        let first_id = index.len();

        for sample in 0u64.. {
            let frame = match reader.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopping at sample {}: {}", sample, e);
                    break;
                }
            };

            let timestamp = (sample * step) as f64 / info.fps;
            if max_seconds.is_some_and(|max| timestamp > max) {
                debug!("Reached duration limit at {:.1}s", timestamp);
                break;
            }
            stats.frames_sampled += 1;

            if !detector.accept(&frame) {
                continue;
            }

            let path = self
                .keyframe_dir
                .join(keyframe_file_name(first_id + stats.keyframes));
            frame.save(&path)?;
            stats.keyframes += 1;

            pending.images.push(frame);
            pending.frames.push((timestamp, path));

            if pending.len() >= self.batch_size {
                self.flush(&mut pending, index).await?;
            }
        }

        if !pending.images.is_empty() {
            self.flush(&mut pending, index).await?;
        }

        info!(
            "Extracted {} keyframes from {} sampled frames",
            stats.keyframes, stats.frames_sampled
        );
        Ok(stats)
    }

    async fn flush(&self, pending: &mut PendingBatch, index: &mut VisualIndex) -> Result<()> {
        let batch = std::mem::take(pending);
        let embeddings = self.embedder.embed_images(&batch.images).await?;
        index.add(embeddings, batch.frames)?;
        debug!("Indexed {} keyframes", index.len());
        Ok(())
    }

    /// Open a frame reader, transcoding once if the source cannot be decoded.
    async fn open_readable(
        &self,
        video_path: &Path,
        options: &KeyframeOptions,
    ) -> Result<(VideoInfo, Box<dyn FrameReader>, bool)> {
        if !video_path.exists() {
            return Err(GlimtError::MediaUnreadable {
                path: video_path.to_path_buf(),
                reason: "file not found".into(),
            });
        }

        let first_error = match self.try_open(video_path, options).await {
            Ok((info, reader)) => return Ok((info, reader, false)),
            Err(e @ GlimtError::ToolNotFound(_)) => return Err(e),
            Err(e) => e,
        };

        warn!("Cannot decode {}: {}; transcoding", video_path.display(), first_error);

        let unreadable = |reason: String| GlimtError::MediaUnreadable {
            path: video_path.to_path_buf(),
            reason,
        };

        let converted = self
            .decoder
            .transcode(video_path)
            .await
            .map_err(|e| unreadable(format!("{first_error}; transcode failed: {e}")))?;

        match self.try_open(&converted, options).await {
            Ok((info, reader)) => Ok((info, reader, true)),
            Err(e) => Err(unreadable(format!(
                "{first_error}; still unreadable after transcode: {e}"
            ))),
        }
    }

    async fn try_open(
        &self,
        path: &Path,
        options: &KeyframeOptions,
    ) -> Result<(VideoInfo, Box<dyn FrameReader>)> {
        let info = self.decoder.probe(path).await?;
        if !info.is_decodable() {
            return Err(GlimtError::InvalidInput(format!(
                "unusable stream ({}x{} @ {} fps)",
                info.width, info.height, info.fps
            )));
        }

        let step = sampling_step(info.fps, options.sample_rate);
        let reader = self.decoder.open(path, &info, step).await?;
        Ok((info, reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ColorImageEmbedder, Scene, SyntheticVideo};

    fn ten_minute_video() -> SyntheticVideo {
        // Cuts at 2:00, 5:00 and 8:00; brightness drifts inside each scene.
        SyntheticVideo::new(
            30.0,
            600.0,
            vec![
                Scene::new(0.0, [220, 30, 30]),
                Scene::new(120.0, [30, 220, 30]),
                Scene::new(300.0, [30, 30, 220]),
                Scene::new(480.0, [220, 220, 30]),
            ],
        )
    }

    fn setup(
        video: SyntheticVideo,
        batch_size: usize,
    ) -> (tempfile::TempDir, Arc<SyntheticVideo>, Arc<ColorImageEmbedder>, KeyframeExtractor, VisualIndex) {
        let dir = tempfile::tempdir().unwrap();
        let video = Arc::new(video);
        let embedder = Arc::new(ColorImageEmbedder::new());
        let extractor = KeyframeExtractor::new(
            video.clone(),
            embedder.clone(),
            dir.path().join("keyframes"),
            batch_size,
        );
        extractor.clear_keyframe_dir().unwrap();
        let index = VisualIndex::new(embedder.clone());
        (dir, video, embedder, extractor, index)
    }

    #[test]
    fn test_sampling_step() {
        assert_eq!(sampling_step(30.0, 1.0), 30);
        assert_eq!(sampling_step(29.97, 1.0), 29);
        assert_eq!(sampling_step(24.0, 0.5), 48);
        assert_eq!(sampling_step(10.0, 100.0), 1);
        assert_eq!(sampling_step(30.0, 0.0), FALLBACK_STEP);
        assert_eq!(sampling_step(30.0, -1.0), FALLBACK_STEP);
    }

    #[test]
    fn test_keyframe_file_name() {
        assert_eq!(keyframe_file_name(0), "frame_00000.jpg");
        assert_eq!(keyframe_file_name(123), "frame_00123.jpg");
    }

    #[tokio::test]
    async fn test_cuts_become_keyframes() {
        let (dir, _video, _embedder, extractor, mut index) = setup(ten_minute_video(), 64);
        let video_path = dir.path().join("talk.mp4");
        std::fs::write(&video_path, b"").unwrap();

        let stats = extractor
            .extract(&video_path, &KeyframeOptions::default(), &mut index)
            .await
            .unwrap();

        assert_eq!(stats.frames_sampled, 600);
        assert_eq!(stats.keyframes, 4);
        assert!(!stats.transcoded);

        let timestamps: Vec<f64> = index.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![0.0, 120.0, 300.0, 480.0]);
        for (i, record) in index.records().iter().enumerate() {
            assert_eq!(record.id, i);
            assert!(record.path.ends_with(keyframe_file_name(i)));
            assert!(record.path.exists());
        }
    }

    #[tokio::test]
    async fn test_partial_batch_is_flushed() {
        let scenes = (0..10)
            .map(|i| {
                let hue = if i % 2 == 0 { [220, 30, 30] } else { [30, 30, 220] };
                Scene::new(i as f64 * 10.0, hue)
            })
            .collect();
        let (dir, _video, embedder, extractor, mut index) =
            setup(SyntheticVideo::new(10.0, 100.0, scenes), 4);
        let video_path = dir.path().join("flicker.mp4");
        std::fs::write(&video_path, b"").unwrap();

        let stats = extractor
            .extract(&video_path, &KeyframeOptions::default(), &mut index)
            .await
            .unwrap();

        assert_eq!(stats.keyframes, 10);
        assert_eq!(index.len(), 10);
        assert_eq!(embedder.batch_sizes(), vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn test_duration_limit_stops_sampling() {
        let (dir, _video, _embedder, extractor, mut index) = setup(ten_minute_video(), 64);
        let video_path = dir.path().join("talk.mp4");
        std::fs::write(&video_path, b"").unwrap();

        let options = KeyframeOptions {
            max_duration_minutes: Some(4.0),
            ..Default::default()
        };
        let stats = extractor.extract(&video_path, &options, &mut index).await.unwrap();

        assert_eq!(stats.frames_sampled, 241);
        assert_eq!(stats.keyframes, 2);
    }

    #[tokio::test]
    async fn test_unreadable_source_is_transcoded_once() {
        let (dir, video, _embedder, extractor, mut index) =
            setup(ten_minute_video().unreadable_until_transcoded(), 64);
        let video_path = dir.path().join("talk.webm");
        std::fs::write(&video_path, b"").unwrap();

        let stats = extractor
            .extract(&video_path, &KeyframeOptions::default(), &mut index)
            .await
            .unwrap();

        assert!(stats.transcoded);
        assert_eq!(stats.keyframes, 4);
        assert_eq!(video.transcode_calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_after_transcode_is_media_unreadable() {
        let (dir, video, _embedder, extractor, mut index) =
            setup(ten_minute_video().never_readable(), 64);
        let video_path = dir.path().join("broken.mp4");
        std::fs::write(&video_path, b"").unwrap();

        let err = extractor
            .extract(&video_path, &KeyframeOptions::default(), &mut index)
            .await
            .unwrap_err();

        assert!(matches!(err, GlimtError::MediaUnreadable { .. }));
        assert_eq!(video.transcode_calls(), 1);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_missing_tools_skip_transcode() {
        let (dir, video, _embedder, extractor, mut index) =
            setup(ten_minute_video().without_tools(), 64);
        let video_path = dir.path().join("talk.mp4");
        std::fs::write(&video_path, b"").unwrap();

        let err = extractor
            .extract(&video_path, &KeyframeOptions::default(), &mut index)
            .await
            .unwrap_err();

        assert!(matches!(err, GlimtError::ToolNotFound(_)));
        assert_eq!(video.transcode_calls(), 0);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_media_unreadable() {
        let (dir, video, _embedder, extractor, mut index) = setup(ten_minute_video(), 64);

        let err = extractor
            .extract(&dir.path().join("nope.mp4"), &KeyframeOptions::default(), &mut index)
            .await
            .unwrap_err();

        assert!(matches!(err, GlimtError::MediaUnreadable { .. }));
        assert_eq!(video.transcode_calls(), 0);
    }
}
