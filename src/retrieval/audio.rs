//! Transcript retrieval: cached transcription and the segment vector index.

use crate::audio::AudioToolkit;
use crate::embedding::TextEmbedder;
use crate::error::{GlimtError, Result};
use crate::transcription::{
    Fingerprint, Reassembler, SpeechToText, TranscribeOptions, TranscriptCache, TranscriptSegment,
};
use crate::vector_store::{create_index, l2_normalize, IndexTopology, VectorIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// One indexed transcript segment.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegmentRecord {
    pub id: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Segment text, trimmed.
    pub text: String,
    /// Unit-norm embedding.
    pub embedding: Vec<f32>,
}

/// A transcript search result.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioHit {
    pub start_seconds: f64,
    pub text: String,
    pub distance: f32,
}

/// Transcript segment embeddings with their records, addressed by id.
pub struct AudioIndex {
    embedder: Arc<dyn TextEmbedder>,
    index: Box<dyn VectorIndex>,
    records: Vec<AudioSegmentRecord>,
}

impl AudioIndex {
    pub fn new(embedder: Arc<dyn TextEmbedder>, topology: IndexTopology) -> Self {
        let index = create_index(topology, embedder.dimensions());
        Self {
            embedder,
            index,
            records: Vec::new(),
        }
    }

    /// Append segments. `embeddings[i]` belongs to `segments[i]`.
    pub fn add(
        &mut self,
        mut embeddings: Vec<Vec<f32>>,
        segments: Vec<TranscriptSegment>,
    ) -> Result<()> {
        if embeddings.len() != segments.len() {
            return Err(GlimtError::VectorIndex(format!(
                "{} embeddings for {} segments",
                embeddings.len(),
                segments.len()
            )));
        }

        for embedding in embeddings.iter_mut() {
            l2_normalize(embedding);
        }
        self.index.add(&embeddings)?;

        let first_id = self.records.len();
        self.records.extend(embeddings.into_iter().zip(segments).enumerate().map(
            |(i, (embedding, segment))| AudioSegmentRecord {
                id: first_id + i,
                start_seconds: segment.start_seconds,
                end_seconds: segment.end_seconds,
                text: segment.text.trim().to_string(),
                embedding,
            },
        ));
        Ok(())
    }

    /// Segments closest to a text query, nearest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<AudioHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut embedding = self.embedder.embed(query).await?;
        l2_normalize(&mut embedding);

        Ok(self
            .index
            .search(&embedding, k)?
            .into_iter()
            .filter_map(|n| {
                self.records.get(n.id).map(|r| AudioHit {
                    start_seconds: r.start_seconds,
                    text: r.text.clone(),
                    distance: n.distance,
                })
            })
            .collect())
    }

    pub fn reset(&mut self) {
        self.index.reset();
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AudioSegmentRecord] {
        &self.records
    }
}

/// Outcome of an audio build.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuildStats {
    pub segments: usize,
    pub from_cache: bool,
}

/// Builds and searches the transcript index of a single video.
pub struct AudioRetriever {
    audio: Arc<dyn AudioToolkit>,
    stt: Arc<dyn SpeechToText>,
    embedder: Arc<dyn TextEmbedder>,
    cache: TranscriptCache,
    options: TranscribeOptions,
    chunk_seconds: u32,
    index: AudioIndex,
}

impl AudioRetriever {
    pub fn new(
        audio: Arc<dyn AudioToolkit>,
        stt: Arc<dyn SpeechToText>,
        embedder: Arc<dyn TextEmbedder>,
        cache: TranscriptCache,
        topology: IndexTopology,
    ) -> Self {
        Self {
            index: AudioIndex::new(embedder.clone(), topology),
            audio,
            stt,
            embedder,
            cache,
            options: TranscribeOptions::default(),
            chunk_seconds: 300,
        }
    }

    /// Set the decoding options used for every transcription.
    pub fn with_options(mut self, options: TranscribeOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the chunk length. 0 transcribes whole tracks.
    pub fn with_chunk_seconds(mut self, chunk_seconds: u32) -> Self {
        self.chunk_seconds = chunk_seconds;
        self
    }

    /// Rebuild the index from the speech in `video_path`.
    ///
    /// `language` overrides the configured language hint for this build.
    #[instrument(skip(self), fields(video = %video_path.display()))]
    pub async fn process_audio(
        &mut self,
        video_path: &Path,
        language: Option<&str>,
    ) -> Result<AudioBuildStats> {
        self.index.reset();

        let track = self.audio.extract_track(video_path).await?;

        let mut options = self.options.clone();
        if let Some(lang) = language {
            options.language = Some(lang.to_string());
        }

        let fingerprint = Fingerprint::compute(
            video_path,
            self.stt.model_name(),
            options.language.as_deref(),
            self.chunk_seconds,
        );

        let (segments, from_cache) = match self.cache.get(&fingerprint) {
            Some(segments) => (segments, true),
            None => {
                let reassembler = Reassembler::new(self.stt.clone(), self.audio.clone(), options);
                let segments = reassembler.transcribe(&track, self.chunk_seconds).await?;
                self.cache.put(&fingerprint, &segments);
                (segments, false)
            }
        };

        if segments.is_empty() {
            return Err(GlimtError::EmptyIndex(format!(
                "no speech transcribed from {}",
                video_path.display()
            )));
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.trim().to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        self.index.add(embeddings, segments)?;

        info!(
            "Audio index ready with {} segments{}",
            self.index.len(),
            if from_cache { " (cached transcript)" } else { "" }
        );

        Ok(AudioBuildStats {
            segments: self.index.len(),
            from_cache,
        })
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<AudioHit>> {
        self.index.search(query, k).await
    }

    pub fn reset(&mut self) {
        self.index.reset();
    }

    pub fn index(&self) -> &AudioIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, SyntheticSpeech};

    fn timeline() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(2.0, 6.0, "  The quarterly revenue grew by ten percent. "),
            TranscriptSegment::new(65.0, 72.0, " Our hiring plan doubles the support team."),
            TranscriptSegment::new(130.0, 139.0, " Questions about the revenue forecast?"),
        ]
    }

    struct Fixture {
        dir: tempfile::TempDir,
        video: std::path::PathBuf,
        speech: Arc<SyntheticSpeech>,
        embedder: Arc<KeywordEmbedder>,
    }

    impl Fixture {
        fn new(speech: SyntheticSpeech) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let video = dir.path().join("meeting.mp4");
            std::fs::write(&video, b"video bytes").unwrap();
            Self {
                dir,
                video,
                speech: Arc::new(speech),
                embedder: Arc::new(KeywordEmbedder::new()),
            }
        }

        fn retriever(&self, topology: IndexTopology) -> AudioRetriever {
            AudioRetriever::new(
                self.speech.clone(),
                self.speech.clone(),
                self.embedder.clone(),
                TranscriptCache::new(self.dir.path().join("cache")),
                topology,
            )
            .with_chunk_seconds(60)
        }
    }

    #[tokio::test]
    async fn test_process_audio_builds_trimmed_records() {
        let fx = Fixture::new(SyntheticSpeech::new(150.0, timeline()));
        let mut retriever = fx.retriever(IndexTopology::Flat);

        let stats = retriever.process_audio(&fx.video, None).await.unwrap();
        assert_eq!(stats, AudioBuildStats { segments: 3, from_cache: false });

        let records = retriever.index().records();
        let ids: Vec<usize> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(records[0].text, "The quarterly revenue grew by ten percent.");
        assert_eq!(records[1].start_seconds, 65.0);
        assert_eq!(records[2].end_seconds, 139.0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_transcription() {
        let fx = Fixture::new(SyntheticSpeech::new(150.0, timeline()));

        let mut first = fx.retriever(IndexTopology::Flat);
        first.process_audio(&fx.video, None).await.unwrap();
        let calls = fx.speech.transcribe_calls();
        assert_eq!(calls, 3);

        let mut second = fx.retriever(IndexTopology::Flat);
        let stats = second.process_audio(&fx.video, None).await.unwrap();

        assert!(stats.from_cache);
        assert_eq!(fx.speech.transcribe_calls(), calls);
        assert_eq!(first.index().records(), second.index().records());
    }

    #[tokio::test]
    async fn test_language_is_part_of_the_fingerprint() {
        let fx = Fixture::new(SyntheticSpeech::new(150.0, timeline()));
        let mut retriever = fx.retriever(IndexTopology::Flat);

        retriever.process_audio(&fx.video, None).await.unwrap();
        let stats = retriever.process_audio(&fx.video, Some("en")).await.unwrap();

        assert!(!stats.from_cache);
        assert_eq!(fx.speech.transcribe_calls(), 6);
    }

    #[tokio::test]
    async fn test_search_ranks_matching_segment_first() {
        for topology in [IndexTopology::Flat, IndexTopology::Hnsw] {
            let fx = Fixture::new(SyntheticSpeech::new(150.0, timeline()));
            let mut retriever = fx.retriever(topology);
            retriever.process_audio(&fx.video, None).await.unwrap();

            let hits = retriever.search("hiring plan support team", 2).await.unwrap();
            assert_eq!(hits.len(), 2);
            assert_eq!(hits[0].start_seconds, 65.0, "{topology}");
            assert!(hits[0].distance <= hits[1].distance);

            assert!(retriever.search("revenue", 0).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_silent_video_is_empty_index() {
        let fx = Fixture::new(SyntheticSpeech::new(90.0, Vec::new()));
        let mut retriever = fx.retriever(IndexTopology::Flat);

        let err = retriever.process_audio(&fx.video, None).await.unwrap_err();

        assert!(matches!(err, GlimtError::EmptyIndex(_)));
        assert!(retriever.index().is_empty());
        assert!(retriever.search("anything", 5).await.unwrap().is_empty());
        assert_eq!(fx.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_index_empty() {
        let fx = Fixture::new(SyntheticSpeech::new(150.0, timeline()));
        let mut retriever = fx.retriever(IndexTopology::Flat);
        retriever.process_audio(&fx.video, None).await.unwrap();

        let broken = Fixture::new(SyntheticSpeech::new(150.0, timeline()).failing_extraction());
        let mut failing = broken.retriever(IndexTopology::Flat);
        let err = failing.process_audio(&broken.video, None).await.unwrap_err();

        assert!(matches!(err, GlimtError::AudioExtractionFailed { .. }));
        assert!(failing.index().is_empty());
        assert_eq!(retriever.index().len(), 3);
    }
}
