//! Index command implementation.

use super::build_orchestrator;
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the index command.
pub async fn run_index(video: &Path, settings: Settings) -> Result<()> {
    build_orchestrator(video, settings).await?;
    Ok(())
}
