//! Configuration module for Glimt.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    AnswerSettings, AudioSettings, EmbeddingSettings, GeneralSettings, OpenAISettings,
    PromptSettings, RetrievalSettings, Settings, VisualSettings,
};
