//! Answer synthesis with an OpenAI chat model.

use super::{context::format_evidence_for_prompt, AnswerSynthesizer};
use crate::config::{AnswerSettings, Prompts};
use crate::error::{GlimtError, Result};
use crate::openai::create_client;
use crate::retrieval::EvidenceBundle;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
    ImageUrlArgs,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Writes answers with a chat completion model, optionally looking at the keyframes.
pub struct OpenAISynthesizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    settings: AnswerSettings,
    prompts: Prompts,
}

impl OpenAISynthesizer {
    pub fn new(settings: AnswerSettings, api_base: Option<&str>) -> Self {
        Self {
            client: create_client(api_base),
            settings,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// The rendered user prompt for `query`.
    pub fn user_prompt(&self, query: &str, evidence: &EvidenceBundle) -> String {
        let mut vars = HashMap::new();
        vars.insert("evidence".to_string(), format_evidence_for_prompt(evidence));
        vars.insert("question".to_string(), query.to_string());
        Prompts::render(&self.prompts.answer.user, &vars)
    }

    /// Keyframes that will be sent along with the prompt, with their data URLs.
    ///
    /// Frames whose file cannot be read are dropped from the listed evidence
    /// too, so prompt numbering matches the attached images.
    fn attachments(&self, evidence: &EvidenceBundle) -> (EvidenceBundle, Vec<String>) {
        if !self.settings.attach_images {
            return (evidence.clone(), Vec::new());
        }

        let mut listed = EvidenceBundle {
            query: evidence.query.clone(),
            visual: Vec::with_capacity(evidence.visual.len()),
            audio: evidence.audio.clone(),
        };
        let mut urls = Vec::with_capacity(evidence.visual.len());
        for item in &evidence.visual {
            if let Some(url) = image_data_url(&item.image_path) {
                listed.visual.push(item.clone());
                urls.push(url);
            }
        }
        (listed, urls)
    }

    fn user_content(
        &self,
        prompt: String,
        image_urls: Vec<String>,
    ) -> Result<ChatCompletionRequestUserMessageContent> {
        if image_urls.is_empty() {
            return Ok(ChatCompletionRequestUserMessageContent::Text(prompt));
        }

        let mut parts = Vec::with_capacity(image_urls.len() + 1);
        for url in image_urls {
            let image_url = ImageUrlArgs::default()
                .url(url)
                .detail(ImageDetail::Low)
                .build()
                .map_err(|e| GlimtError::Synthesis(e.to_string()))?;
            let part = ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(image_url)
                .build()
                .map_err(|e| GlimtError::Synthesis(e.to_string()))?;
            parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(part));
        }

        let text = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(prompt)
            .build()
            .map_err(|e| GlimtError::Synthesis(e.to_string()))?;
        parts.push(ChatCompletionRequestUserMessageContentPart::Text(text));

        Ok(ChatCompletionRequestUserMessageContent::Array(parts))
    }
}

/// Inline a keyframe as a `data:` URL. Unreadable files are skipped.
fn image_data_url(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))),
        Err(e) => {
            warn!("Skipping keyframe {}: {}", path.display(), e);
            None
        }
    }
}

#[async_trait]
impl AnswerSynthesizer for OpenAISynthesizer {
    #[instrument(skip(self, evidence), fields(query = %query))]
    async fn answer(&self, query: &str, evidence: &EvidenceBundle) -> Result<String> {
        let (listed, image_urls) = self.attachments(evidence);
        let prompt = self.user_prompt(query, &listed);
        let content = self.user_content(prompt, image_urls)?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.answer.system.clone())
                .build()
                .map_err(|e| GlimtError::Synthesis(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| GlimtError::Synthesis(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_completion_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| GlimtError::Synthesis(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GlimtError::OpenAI(format!("Failed to generate answer: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| GlimtError::Synthesis("Empty response from model".to_string()))?;

        debug!(
            "Answered from {} keyframes and {} transcript segments",
            evidence.visual.len(),
            evidence.audio.len()
        );
        Ok(answer)
    }
}
