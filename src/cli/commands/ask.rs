//! Ask command implementation.

use super::build_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the ask command.
pub async fn run_ask(
    video: &Path,
    question: &str,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.answer.model = model;
    }

    let orchestrator = build_orchestrator(video, settings).await?;

    let spinner = Output::spinner("Thinking...");
    let result = orchestrator.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("\n{}\n", answer.text);
            Output::evidence(&answer.evidence);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
