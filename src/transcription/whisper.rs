//! Whisper transcription over an OpenAI-compatible endpoint.

use super::{SpeechToText, TranscribeOptions, TranscriptSegment};
use crate::error::{GlimtError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Whisper-based speech-to-text.
///
/// The hosted API has no beam or precision controls, so `beam_size` and
/// `half_precision` only reach self-hosted servers that read them.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with default settings.
    pub fn new() -> Self {
        Self::with_config("whisper-1", None)
    }

    /// Create a new Whisper transcriber for a model and optional endpoint.
    pub fn with_config(model: &str, api_base: Option<&str>) -> Self {
        Self {
            client: create_client(api_base),
            model: model.to_string(),
        }
    }
}

impl Default for WhisperTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    #[instrument(skip(self, options), fields(audio_path = %audio_path.display()))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .temperature(options.temperature)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = options.language.as_deref() {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| GlimtError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| GlimtError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = match response.segments {
            Some(segs) => segs
                .iter()
                .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.clone()))
                .collect(),
            // Fallback: one segment spanning the whole file
            None if !response.text.trim().is_empty() => vec![TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.clone(),
            )],
            None => Vec::new(),
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
