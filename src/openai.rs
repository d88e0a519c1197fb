//! OpenAI client configuration.

use async_openai::{config::OpenAIConfig, Client};

/// Create an OpenAI client, optionally pointed at an OpenAI-compatible server.
///
/// Model calls are not wrapped in a timeout; a slow transcription runs to completion.
pub fn create_client(api_base: Option<&str>) -> Client<OpenAIConfig> {
    let config = match api_base {
        Some(base) => OpenAIConfig::default().with_api_base(base),
        None => OpenAIConfig::default(),
    };
    Client::with_config(config)
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty())
}
