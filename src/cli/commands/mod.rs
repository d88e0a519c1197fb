//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod index;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::{resolve_config_path, run_config};
pub use doctor::run_doctor;
pub use index::run_index;
pub use search::run_search;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::GlimtError;
use crate::orchestrator::{BuildReport, Orchestrator};
use anyhow::Result;
use std::path::Path;
use tracing::warn;

/// Check requirements, build both indices for `video` and report the outcome.
///
/// Fails only when neither modality can be searched.
pub(crate) async fn build_orchestrator(video: &Path, settings: Settings) -> Result<Orchestrator> {
    if let Err(e) = preflight::check(Operation::Build) {
        Output::error(&format!("{}", e));
        Output::info("Run 'glimt doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", video.display()));
    let report = orchestrator.build(video).await;
    spinner.finish_and_clear();

    print_report(&report);

    if !report.is_searchable() {
        anyhow::bail!("Nothing to search: both pipelines failed for {}", video.display());
    }
    Ok(orchestrator)
}

fn print_report(report: &BuildReport) {
    match &report.visual {
        Ok(stats) => Output::success(&format!(
            "Keyframes: {} from {} sampled frames{}",
            stats.keyframes,
            stats.frames_sampled,
            if stats.transcoded { " (transcoded)" } else { "" }
        )),
        Err(e) => Output::warning(&failure_line("Keyframes", e)),
    }

    match &report.audio {
        Ok(stats) => Output::success(&format!(
            "Transcript: {} segments{}",
            stats.segments,
            if stats.from_cache { " (cached)" } else { "" }
        )),
        Err(e) => Output::warning(&failure_line("Transcript", e)),
    }
}

/// One-line summary of a failed pipeline.
///
/// Unreadable media and empty indices are reported as they are. Anything else
/// is logged and summarized without detail.
fn failure_line(modality: &str, err: &GlimtError) -> String {
    if err.is_user_visible() {
        format!("{} unavailable: {}", modality, err)
    } else {
        warn!("{} pipeline failed: {}", modality, err);
        format!("{} unavailable (run with -v for details)", modality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_failure_line_shows_media_and_empty_index_errors() {
        let unreadable = GlimtError::MediaUnreadable {
            path: PathBuf::from("clip.mp4"),
            reason: "no video stream".into(),
        };
        let line = failure_line("Keyframes", &unreadable);
        assert!(line.starts_with("Keyframes unavailable: "));
        assert!(line.contains("no video stream"));

        let empty = GlimtError::EmptyIndex("no transcript segments".into());
        assert!(failure_line("Transcript", &empty).contains("no transcript segments"));
    }

    #[test]
    fn test_failure_line_hides_other_errors() {
        let hidden = [
            GlimtError::AudioExtractionFailed {
                path: PathBuf::from("clip.mp4"),
                reason: "secret detail".into(),
            },
            GlimtError::Transcription("secret detail".into()),
            GlimtError::OpenAI("secret detail".into()),
            GlimtError::ToolFailed("secret detail".into()),
            GlimtError::CacheIo {
                path: PathBuf::from("cache.json"),
                reason: "secret detail".into(),
            },
        ];

        for err in &hidden {
            assert!(!err.is_user_visible());
            let line = failure_line("Transcript", err);
            assert_eq!(line, "Transcript unavailable (run with -v for details)");
        }
    }
}
