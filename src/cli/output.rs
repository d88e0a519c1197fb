//! CLI output formatting utilities.

use crate::retrieval::{AudioEvidence, EvidenceBundle, VisualEvidence};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a retrieved keyframe.
    pub fn visual_hit(hit: &VisualEvidence) {
        println!(
            "  {} {} (distance: {:.3})  {}",
            style("*").cyan(),
            style(&hit.timestamp).cyan().bold(),
            hit.distance,
            style(hit.image_path.display()).dim()
        );
    }

    /// Print a retrieved transcript segment.
    pub fn audio_hit(hit: &AudioEvidence) {
        println!(
            "  {} {} (distance: {:.3})  {}",
            style("*").green(),
            style(&hit.timestamp).green().bold(),
            hit.distance,
            hit.excerpt.replace('\n', " ")
        );
    }

    /// Print both evidence lists.
    pub fn evidence(bundle: &EvidenceBundle) {
        Output::header("Keyframes");
        if bundle.visual.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for hit in &bundle.visual {
            Output::visual_hit(hit);
        }

        Output::header("Transcript");
        if bundle.audio.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for hit in &bundle.audio {
            Output::audio_hit(hit);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
