//! Prompt templates for Glimt.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
}

/// Prompts for multimodal answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    /// Rendered with `{{evidence}}` and `{{question}}`.
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video assistant. You answer questions about a single video using screenshots taken from it and excerpts of its spoken transcript. Refer to moments in the video by their MM:SS timestamps."#.to_string(),

            user: r#"{{evidence}}
User Query: {{question}}

Instructions:
1. **Synthesize**: Combine the visual slides (OCR) and the speech transcript to answer.
2. **List Extraction**: If the user asks for a list, extract unique names from the slides/audio. **Do not repeat names.**
3. **Priority**: If the visual text is blurry, RELY on the Audio Transcript.
4. **Concise**: Give a direct and summarized answer."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding the defaults with `answer.toml` from a custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.answer.system.is_empty());
        assert!(prompts.answer.user.contains("{{question}}"));
        assert!(prompts.answer.user.contains("{{evidence}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_load_custom_answer_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "system = \"Be brief.\"\nuser = \"{{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.answer.system, "Be brief.");
        assert_eq!(prompts.answer.user, "{{question}}");
    }
}
