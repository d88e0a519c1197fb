//! Pipeline orchestrator for Glimt.
//!
//! Builds both modality indices for one video and answers queries over them.

use crate::audio::{AudioToolkit, FfmpegAudio};
use crate::config::{Prompts, Settings};
use crate::embedding::{ClipEmbedder, ImageEmbedder, OpenAIEmbedder, TextEmbedder};
use crate::error::{GlimtError, Result};
use crate::rag::{Answer, AnswerSynthesizer, OpenAISynthesizer};
use crate::retrieval::{AudioBuildStats, AudioRetriever, EvidenceBundle, EvidenceFusion, VideoRetriever};
use crate::transcription::{SpeechToText, TranscribeOptions, TranscriptCache, WhisperTranscriber};
use crate::video::{ExtractionStats, FfmpegDecoder, KeyframeOptions, VideoDecoder};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Collaborators the orchestrator is built from.
pub struct Components {
    pub decoder: Arc<dyn VideoDecoder>,
    pub image_embedder: Arc<dyn ImageEmbedder>,
    pub audio: Arc<dyn AudioToolkit>,
    pub stt: Arc<dyn SpeechToText>,
    pub text_embedder: Arc<dyn TextEmbedder>,
    pub synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
}

impl Components {
    /// Production collaborators configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_base = settings.openai.api_base.as_deref();
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        Ok(Self {
            decoder: Arc::new(FfmpegDecoder::new()),
            image_embedder: Arc::new(ClipEmbedder::new(
                &settings.visual.clip_endpoint,
                &settings.visual.clip_model,
                settings.visual.dimensions,
            )),
            audio: Arc::new(FfmpegAudio::new()),
            stt: Arc::new(WhisperTranscriber::with_config(
                &settings.audio.model_size,
                api_base,
            )),
            text_embedder: Arc::new(OpenAIEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
                api_base,
            )),
            synthesizer: Some(Arc::new(
                OpenAISynthesizer::new(settings.answer.clone(), api_base).with_prompts(prompts),
            )),
        })
    }
}

/// Outcome of building both indices. Each modality succeeds or fails on its own.
#[derive(Debug)]
pub struct BuildReport {
    pub visual: Result<ExtractionStats>,
    pub audio: Result<AudioBuildStats>,
}

impl BuildReport {
    /// Whether at least one modality can be searched.
    pub fn is_searchable(&self) -> bool {
        self.visual.is_ok() || self.audio.is_ok()
    }

    pub fn keyframes(&self) -> usize {
        self.visual.as_ref().map(|s| s.keyframes).unwrap_or(0)
    }

    pub fn segments(&self) -> usize {
        self.audio.as_ref().map(|s| s.segments).unwrap_or(0)
    }
}

/// The main orchestrator for the Glimt pipeline.
pub struct Orchestrator {
    settings: Settings,
    video: VideoRetriever,
    audio: AudioRetriever,
    fusion: EvidenceFusion,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
}

impl Orchestrator {
    /// Create an orchestrator with the production collaborators.
    pub fn new(settings: Settings) -> Result<Self> {
        let components = Components::from_settings(&settings)?;
        Self::with_components(settings, components)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(settings: Settings, components: Components) -> Result<Self> {
        settings.validate()?;

        let cache_dir = settings.cache_dir();
        std::fs::create_dir_all(&cache_dir)?;

        let video = VideoRetriever::new(
            components.decoder,
            components.image_embedder,
            settings.keyframe_dir(),
            settings.visual.batch_size,
        )?;

        let options = TranscribeOptions {
            beam_size: settings.audio.beam_size,
            temperature: settings.audio.temperature,
            language: settings.audio.language.clone(),
            half_precision: settings.audio.half_precision,
        };
        let audio = AudioRetriever::new(
            components.audio,
            components.stt,
            components.text_embedder,
            TranscriptCache::new(cache_dir),
            settings.audio.topology,
        )
        .with_options(options)
        .with_chunk_seconds(settings.audio.chunk_seconds);

        Ok(Self {
            fusion: EvidenceFusion::new(settings.retrieval.clone()),
            settings,
            video,
            audio,
            synthesizer: components.synthesizer,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build both indices for `video_path`, concurrently.
    #[instrument(skip(self), fields(video = %video_path.display()))]
    pub async fn build(&mut self, video_path: &Path) -> BuildReport {
        let options = KeyframeOptions {
            sample_rate: self.settings.visual.sample_rate,
            diff_threshold: self.settings.visual.diff_threshold,
            max_duration_minutes: self.settings.visual.max_duration_minutes,
        };
        let language = self.settings.audio.language.clone();

        let (visual, audio) = tokio::join!(
            self.video.process_video(video_path, &options),
            self.audio.process_audio(video_path, language.as_deref()),
        );

        if let Err(e) = &visual {
            warn!("Visual pipeline failed: {}", e);
        }
        if let Err(e) = &audio {
            warn!("Audio pipeline failed: {}", e);
        }

        let report = BuildReport { visual, audio };
        info!(
            "Build finished: {} keyframes, {} segments",
            report.keyframes(),
            report.segments()
        );
        report
    }

    /// Retrieve evidence with the configured `k` per modality.
    pub async fn retrieve(&self, query: &str) -> Result<EvidenceBundle> {
        self.fusion.retrieve(&self.video, &self.audio, query).await
    }

    /// Retrieve evidence with explicit `k` per modality.
    pub async fn retrieve_with(
        &self,
        query: &str,
        k_visual: usize,
        k_audio: usize,
    ) -> Result<EvidenceBundle> {
        self.fusion
            .retrieve_with(&self.video, &self.audio, query, k_visual, k_audio)
            .await
    }

    /// Retrieve evidence and have the synthesizer answer from it.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| GlimtError::Config("No answer synthesizer configured".into()))?;

        let evidence = self.retrieve(query).await?;
        if evidence.is_empty() {
            return Ok(Answer {
                text: "I couldn't find any relevant evidence in this video for this question."
                    .to_string(),
                evidence,
            });
        }

        let capped = evidence.for_synthesis(self.fusion.settings().max_audio_evidence);
        let text = synthesizer.answer(query, &capped).await?;

        Ok(Answer { text, evidence })
    }
}
