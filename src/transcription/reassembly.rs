//! Chunked transcription with timestamps rebased onto the whole track.

use super::{SpeechToText, TranscribeOptions, TranscriptSegment};
use crate::audio::AudioToolkit;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Shift each chunk's segments by the total length of the chunks before it.
///
/// `chunks[i]` holds the segments of chunk `i` relative to its own start and
/// `durations[i]` its measured length. Segments are never merged across
/// chunk boundaries.
pub fn rebase(chunks: Vec<Vec<TranscriptSegment>>, durations: &[f64]) -> Vec<TranscriptSegment> {
    let mut offset = 0.0;
    let mut out = Vec::new();

    for (segments, duration) in chunks.into_iter().zip(durations) {
        out.extend(segments.into_iter().map(|s| s.shifted(offset)));
        offset += duration;
    }
    out
}

/// Transcribes a track, optionally in fixed-length chunks.
pub struct Reassembler {
    stt: Arc<dyn SpeechToText>,
    audio: Arc<dyn AudioToolkit>,
    options: TranscribeOptions,
}

impl Reassembler {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        audio: Arc<dyn AudioToolkit>,
        options: TranscribeOptions,
    ) -> Self {
        Self { stt, audio, options }
    }

    pub fn options(&self) -> &TranscribeOptions {
        &self.options
    }

    pub fn model_name(&self) -> &str {
        self.stt.model_name()
    }

    /// Transcribe `audio_path` with timestamps relative to its start.
    ///
    /// `chunk_seconds == 0` transcribes the whole file in one call. Otherwise
    /// the file is split into a scratch directory next to it, which is removed
    /// afterwards whether or not transcription succeeded.
    #[instrument(skip(self), fields(audio = %audio_path.display()))]
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        chunk_seconds: u32,
    ) -> Result<Vec<TranscriptSegment>> {
        if chunk_seconds == 0 {
            return self.stt.transcribe(audio_path, &self.options).await;
        }

        let parent = audio_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let scratch = match tempfile::Builder::new()
            .prefix(&format!("{stem}_chunks"))
            .tempdir_in(parent)
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Cannot create chunk directory in {}: {}; transcribing whole file", parent.display(), e);
                return self.stt.transcribe(audio_path, &self.options).await;
            }
        };

        let result = self
            .transcribe_chunked(audio_path, chunk_seconds, scratch.path())
            .await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove chunk directory {}: {}", scratch_path.display(), e);
        }

        result
    }

    async fn transcribe_chunked(
        &self,
        audio_path: &Path,
        chunk_seconds: u32,
        scratch_dir: &Path,
    ) -> Result<Vec<TranscriptSegment>> {
        let chunks = match self
            .audio
            .split_into_chunks(audio_path, chunk_seconds, scratch_dir)
            .await
        {
            Ok(chunks) if !chunks.is_empty() => chunks,
            Ok(_) => {
                warn!("Splitting produced no chunks; transcribing whole file");
                return self.stt.transcribe(audio_path, &self.options).await;
            }
            Err(e) => {
                warn!("Splitting failed: {}; transcribing whole file", e);
                return self.stt.transcribe(audio_path, &self.options).await;
            }
        };

        info!("Transcribing {} chunks of {}s", chunks.len(), chunk_seconds);

        let mut per_chunk = Vec::with_capacity(chunks.len());
        let mut durations = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let segments = self.stt.transcribe(chunk, &self.options).await?;
            let duration = match self.audio.duration(chunk).await {
                Some(d) => d,
                None => {
                    warn!("Cannot measure {}; assuming {}s", chunk.display(), chunk_seconds);
                    chunk_seconds as f64
                }
            };
            debug!("Chunk {}: {} segments, {:.2}s", i, segments.len(), duration);

            per_chunk.push(segments);
            durations.push(duration);
        }

        Ok(rebase(per_chunk, &durations))
    }
}
