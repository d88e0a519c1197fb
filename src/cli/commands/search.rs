//! Search command implementation.

use super::build_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the search command.
pub async fn run_search(
    video: &Path,
    query: &str,
    k_visual: Option<usize>,
    k_audio: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let k_visual = k_visual.unwrap_or(settings.retrieval.k_visual);
    let k_audio = k_audio.unwrap_or(settings.retrieval.k_audio);

    let orchestrator = build_orchestrator(video, settings).await?;
    let bundle = orchestrator.retrieve_with(query, k_visual, k_audio).await?;

    if bundle.is_empty() {
        Output::info("No results found.");
        return Ok(());
    }

    Output::evidence(&bundle);
    Ok(())
}
