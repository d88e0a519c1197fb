//! In-process fakes for model collaborators and media tooling.

use crate::audio::{track_path_for, AudioToolkit};
use crate::embedding::{ImageEmbedder, TextEmbedder};
use crate::error::{GlimtError, Result};
use crate::rag::AnswerSynthesizer;
use crate::retrieval::EvidenceBundle;
use crate::transcription::{SpeechToText, TranscribeOptions, TranscriptSegment};
use crate::video::{FrameReader, VideoDecoder, VideoInfo};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const FRAME_WIDTH: u32 = 16;
const FRAME_HEIGHT: u32 = 12;

/// A constant-hue stretch of synthetic video.
#[derive(Debug, Clone)]
pub struct Scene {
    pub start: f64,
    pub color: [u8; 3],
}

impl Scene {
    pub fn new(start: f64, color: [u8; 3]) -> Self {
        Self { start, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Readability {
    Readable,
    AfterTranscode,
    Never,
    MissingTools,
}

/// Decoder producing solid-color frames from a scene list.
///
/// Brightness drifts slowly inside a scene while hue stays fixed.
pub struct SyntheticVideo {
    fps: f64,
    duration: f64,
    scenes: Vec<Scene>,
    readability: Readability,
    transcodes: AtomicUsize,
}

impl SyntheticVideo {
    pub fn new(fps: f64, duration: f64, scenes: Vec<Scene>) -> Self {
        Self {
            fps,
            duration,
            scenes,
            readability: Readability::Readable,
            transcodes: AtomicUsize::new(0),
        }
    }

    /// Probing fails until the file has been transcoded.
    pub fn unreadable_until_transcoded(mut self) -> Self {
        self.readability = Readability::AfterTranscode;
        self
    }

    /// Probing always fails.
    pub fn never_readable(mut self) -> Self {
        self.readability = Readability::Never;
        self
    }

    /// Probing fails as if ffprobe were not installed.
    pub fn without_tools(mut self) -> Self {
        self.readability = Readability::MissingTools;
        self
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcodes.load(Ordering::SeqCst)
    }

    fn frame_count(&self) -> u64 {
        (self.duration * self.fps).round() as u64
    }

    fn frame_at(&self, index: u64) -> RgbImage {
        let t = index as f64 / self.fps;
        let scene = self
            .scenes
            .iter()
            .rev()
            .find(|s| s.start <= t)
            .or_else(|| self.scenes.first());
        let [r, g, b] = scene.map(|s| s.color).unwrap_or([0, 0, 0]);

        let scale = 1.0 - 0.4 * ((t % 10.0) / 10.0);
        let dim = |c: u8| (c as f64 * scale).round() as u8;
        RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([dim(r), dim(g), dim(b)]))
    }

    fn is_transcoded(path: &Path) -> bool {
        path.to_string_lossy().ends_with("_h264.mp4")
    }
}

#[async_trait]
impl VideoDecoder for SyntheticVideo {
    async fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let readable = match self.readability {
            Readability::Readable => true,
            Readability::AfterTranscode => Self::is_transcoded(path),
            Readability::Never => false,
            Readability::MissingTools => return Err(GlimtError::ToolNotFound("ffprobe".into())),
        };
        if !readable {
            return Err(GlimtError::ToolFailed("Invalid data found when processing input".into()));
        }

        Ok(VideoInfo {
            fps: self.fps,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            duration_seconds: Some(self.duration),
        })
    }

    async fn open(&self, _path: &Path, _info: &VideoInfo, step: u64) -> Result<Box<dyn FrameReader>> {
        let frames = (0..self.frame_count())
            .step_by(step.max(1) as usize)
            .map(|i| self.frame_at(i))
            .collect::<Vec<_>>();
        Ok(Box::new(VecFrameReader {
            frames: frames.into_iter(),
        }))
    }

    async fn transcode(&self, path: &Path) -> Result<PathBuf> {
        self.transcodes.fetch_add(1, Ordering::SeqCst);
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        Ok(path.with_file_name(format!("{stem}_h264.mp4")))
    }
}

struct VecFrameReader {
    frames: std::vec::IntoIter<RgbImage>,
}

#[async_trait]
impl FrameReader for VecFrameReader {
    async fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.next())
    }
}

/// Image embedder placing each frame at its mean color.
///
/// Text queries name a color: "red", "green", "blue" or "yellow".
pub struct ColorImageEmbedder {
    dimensions: usize,
    batches: Mutex<Vec<usize>>,
}

impl ColorImageEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: 512,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of every `embed_images` call so far.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    fn padded(&self, rgb: [f32; 3]) -> Vec<f32> {
        let mut v = vec![0.0; self.dimensions];
        v[..3].copy_from_slice(&rgb);
        v
    }
}

#[async_trait]
impl ImageEmbedder for ColorImageEmbedder {
    async fn embed_images(&self, images: &[RgbImage]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(images.len());

        Ok(images
            .iter()
            .map(|img| {
                let n = img.pixels().len().max(1) as f32;
                let mut sum = [0.0f32; 3];
                for p in img.pixels() {
                    for c in 0..3 {
                        sum[c] += p.0[c] as f32;
                    }
                }
                self.padded([sum[0] / n, sum[1] / n, sum[2] / n])
            })
            .collect())
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let rgb = match text.to_lowercase().as_str() {
            "red" => [1.0, 0.0, 0.0],
            "green" => [0.0, 1.0, 0.0],
            "blue" => [0.0, 0.0, 1.0],
            "yellow" => [1.0, 1.0, 0.0],
            _ => [1.0, 1.0, 1.0],
        };
        Ok(self.padded(rgb))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Bag-of-words text embedder: each lowercase word increments one hashed bucket.
pub struct KeywordEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: 384,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl TextEmbedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Audio toolkit and speech-to-text over a scripted timeline of utterances.
///
/// Every file it hands out (track or chunk) maps to a window of the timeline;
/// transcribing a file returns the utterances starting in its window, relative
/// to the window start.
pub struct SyntheticSpeech {
    duration: f64,
    timeline: Vec<TranscriptSegment>,
    windows: Mutex<HashMap<PathBuf, (f64, f64)>>,
    transcribes: AtomicUsize,
    measurable: bool,
    split_fails: bool,
    extract_fails: bool,
    failing_chunk: Option<usize>,
}

impl SyntheticSpeech {
    pub fn new(duration: f64, timeline: Vec<TranscriptSegment>) -> Self {
        Self {
            duration,
            timeline,
            windows: Mutex::new(HashMap::new()),
            transcribes: AtomicUsize::new(0),
            measurable: true,
            split_fails: false,
            extract_fails: false,
            failing_chunk: None,
        }
    }

    pub fn without_durations(mut self) -> Self {
        self.measurable = false;
        self
    }

    pub fn failing_split(mut self) -> Self {
        self.split_fails = true;
        self
    }

    pub fn failing_extraction(mut self) -> Self {
        self.extract_fails = true;
        self
    }

    /// Transcribing chunk `index` fails.
    pub fn failing_chunk(mut self, index: usize) -> Self {
        self.failing_chunk = Some(index);
        self
    }

    pub fn transcribe_calls(&self) -> usize {
        self.transcribes.load(Ordering::SeqCst)
    }

    fn window(&self, path: &Path) -> Option<(f64, f64)> {
        self.windows.lock().unwrap().get(path).copied()
    }
}

#[async_trait]
impl AudioToolkit for SyntheticSpeech {
    async fn extract_track(&self, video_path: &Path) -> Result<PathBuf> {
        if self.extract_fails {
            return Err(GlimtError::AudioExtractionFailed {
                path: video_path.to_path_buf(),
                reason: "no audio stream".into(),
            });
        }

        let track = track_path_for(video_path);
        if !track.exists() {
            std::fs::write(&track, b"")?;
        }
        self.windows
            .lock()
            .unwrap()
            .insert(track.clone(), (0.0, self.duration));
        Ok(track)
    }

    async fn split_into_chunks(
        &self,
        _audio_path: &Path,
        chunk_seconds: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if self.split_fails {
            return Err(GlimtError::ToolFailed("ffmpeg: segment muxer failed".into()));
        }

        let length = chunk_seconds as f64;
        let mut chunks = Vec::new();
        let mut start = 0.0;
        while start < self.duration {
            let path = scratch_dir.join(format!("chunk_{:03}.wav", chunks.len()));
            std::fs::write(&path, b"")?;
            self.windows
                .lock()
                .unwrap()
                .insert(path.clone(), (start, (start + length).min(self.duration)));
            chunks.push(path);
            start += length;
        }
        Ok(chunks)
    }

    async fn duration(&self, path: &Path) -> Option<f64> {
        if !self.measurable {
            return None;
        }
        self.window(path).map(|(start, end)| end - start)
    }
}

#[async_trait]
impl SpeechToText for SyntheticSpeech {
    async fn transcribe(
        &self,
        audio_path: &Path,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>> {
        self.transcribes.fetch_add(1, Ordering::SeqCst);

        if let Some(i) = self.failing_chunk {
            if audio_path.ends_with(format!("chunk_{i:03}.wav")) {
                return Err(GlimtError::Transcription("model crashed".into()));
            }
        }

        let (start, end) = self
            .window(audio_path)
            .ok_or_else(|| GlimtError::Transcription(format!("unknown file {}", audio_path.display())))?;

        Ok(self
            .timeline
            .iter()
            .filter(|s| s.start_seconds >= start && s.start_seconds < end)
            .map(|s| {
                TranscriptSegment::new(
                    s.start_seconds - start,
                    s.end_seconds.min(end) - start,
                    s.text.clone(),
                )
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "synthetic"
    }
}

/// Synthesizer that reports how much evidence it was given.
pub struct CountingSynthesizer;

#[async_trait]
impl AnswerSynthesizer for CountingSynthesizer {
    async fn answer(&self, query: &str, evidence: &EvidenceBundle) -> Result<String> {
        Ok(format!(
            "{query}: {} screenshots, {} quotes",
            evidence.visual.len(),
            evidence.audio.len()
        ))
    }
}
