//! Configuration settings for Glimt.

use crate::vector_store::IndexTopology;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub visual: VisualSettings,
    pub audio: AudioSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub openai: OpenAISettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Working directory for keyframe images. Cleared whenever a video retriever is created.
    pub keyframe_dir: String,
    /// Directory holding one JSON transcript file per fingerprint.
    pub cache_dir: String,
    /// Log level when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.glimt".to_string(),
            keyframe_dir: "~/.glimt/keyframes".to_string(),
            cache_dir: "~/.glimt/audio_cache".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Keyframe extraction and visual embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Frames per second to sample from the native stream.
    pub sample_rate: f64,
    /// Shot change score above which a sampled frame becomes a keyframe.
    pub diff_threshold: f64,
    /// Stop sampling after this many minutes (None processes the whole video).
    pub max_duration_minutes: Option<f64>,
    /// Keyframes per image-embedding call.
    pub batch_size: usize,
    /// Base URL of the CLIP encoding service.
    pub clip_endpoint: String,
    /// CLIP model name passed to the service.
    pub clip_model: String,
    /// Embedding dimensions of the visual space.
    pub dimensions: usize,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            diff_threshold: 0.15,
            max_duration_minutes: None,
            batch_size: 64,
            clip_endpoint: "http://127.0.0.1:51000".to_string(),
            clip_model: "ViT-B/32".to_string(),
            dimensions: 512,
        }
    }
}

/// Audio transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Speech-to-text model. Part of the transcript cache fingerprint.
    pub model_size: String,
    /// Language hint (None lets the model detect it).
    pub language: Option<String>,
    /// Chunk length in seconds for long audio. 0 transcribes the whole file at once.
    pub chunk_seconds: u32,
    /// Beam width for decoders that support it.
    pub beam_size: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request half-precision inference where the backend supports it.
    pub half_precision: bool,
    /// Index topology for transcript segments.
    pub topology: IndexTopology,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            model_size: "whisper-1".to_string(),
            language: None,
            chunk_seconds: 300,
            beam_size: 1,
            temperature: 0.0,
            half_precision: true,
            topology: IndexTopology::Flat,
        }
    }
}

/// Transcript embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
        }
    }
}

/// Query-time retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Keyframes to retrieve per query.
    pub k_visual: usize,
    /// Transcript segments to retrieve per query.
    pub k_audio: usize,
    /// Maximum audio items handed to answer synthesis.
    pub max_audio_evidence: usize,
    /// Characters of transcript text kept in an evidence excerpt.
    pub excerpt_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k_visual: 6,
            k_audio: 6,
            max_audio_evidence: 10,
            excerpt_chars: 80,
        }
    }
}

/// Answer synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Chat model used to write the answer.
    pub model: String,
    pub temperature: f32,
    /// Send retrieved keyframes to the model as images.
    pub attach_images: bool,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            attach_images: true,
            max_tokens: 512,
        }
    }
}

/// OpenAI client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct OpenAISettings {
    /// Override for OpenAI-compatible servers (e.g. a local Whisper server).
    pub api_base: Option<String>,
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values that would make a build meaningless.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::GlimtError;

        if self.visual.batch_size == 0 {
            return Err(GlimtError::Config("visual.batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.visual.diff_threshold) {
            return Err(GlimtError::Config(format!(
                "visual.diff_threshold must be within [0, 1], got {}",
                self.visual.diff_threshold
            )));
        }
        if self.visual.dimensions == 0 || self.embedding.dimensions == 0 {
            return Err(GlimtError::Config("embedding dimensions must be positive".into()));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glimt")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded keyframe directory path.
    pub fn keyframe_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.keyframe_dir)
    }

    /// Get the expanded transcript cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }
}
