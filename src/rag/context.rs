//! Evidence rendering for answer prompts and terminal display.

use crate::retrieval::EvidenceBundle;
use std::fmt::Write;

/// Render the evidence section of the answer prompt.
///
/// Keyframes are listed by position, with their file, so the model can match
/// them with the attached images. Audio items are quoted verbatim.
pub fn format_evidence_for_prompt(evidence: &EvidenceBundle) -> String {
    let mut out = String::from("Visual Evidence (Screenshots):\n");
    for (i, item) in evidence.visual.iter().enumerate() {
        let _ = writeln!(
            out,
            "Image {}: Timestamp {} ({})",
            i + 1,
            item.timestamp,
            item.image_path.display()
        );
    }

    out.push_str("\nAudio Transcript Evidence:\n");
    if evidence.audio.is_empty() {
        out.push_str("(No relevant audio found)\n");
    } else {
        for item in &evidence.audio {
            let _ = writeln!(out, "- At {}: \"{}\"", item.timestamp, item.text);
        }
    }

    out
}

/// Render the evidence for the user, one line per hit.
pub fn format_evidence_for_display(evidence: &EvidenceBundle) -> String {
    let mut lines = Vec::new();

    for item in &evidence.visual {
        lines.push(format!(
            "[frame] {} (distance: {:.3})  {}",
            item.timestamp,
            item.distance,
            item.image_path.display()
        ));
    }
    for item in &evidence.audio {
        lines.push(format!(
            "[audio] {} (distance: {:.3})  {}",
            item.timestamp, item.distance, item.excerpt
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{AudioEvidence, VisualEvidence};
    use std::path::PathBuf;

    fn bundle() -> EvidenceBundle {
        EvidenceBundle {
            query: "who presented?".into(),
            visual: vec![
                VisualEvidence {
                    timestamp_seconds: 125.0,
                    timestamp: "02:05".into(),
                    distance: 0.4,
                    image_path: PathBuf::from("/k/frame_00003.jpg"),
                },
                VisualEvidence {
                    timestamp_seconds: 3.0,
                    timestamp: "00:03".into(),
                    distance: 0.9,
                    image_path: PathBuf::from("/k/frame_00000.jpg"),
                },
            ],
            audio: vec![AudioEvidence {
                start_seconds: 61.0,
                timestamp: "01:01".into(),
                distance: 0.2,
                text: "Maria from Uppsala presented first.".into(),
                excerpt: "Maria from Uppsala presented first.".into(),
            }],
        }
    }

    #[test]
    fn test_prompt_lists_both_modalities() {
        let text = format_evidence_for_prompt(&bundle());
        assert_eq!(
            text,
            "Visual Evidence (Screenshots):\n\
             Image 1: Timestamp 02:05 (/k/frame_00003.jpg)\n\
             Image 2: Timestamp 00:03 (/k/frame_00000.jpg)\n\
             \n\
             Audio Transcript Evidence:\n\
             - At 01:01: \"Maria from Uppsala presented first.\"\n"
        );
    }

    #[test]
    fn test_prompt_without_audio() {
        let mut evidence = bundle();
        evidence.audio.clear();
        let text = format_evidence_for_prompt(&evidence);
        assert!(text.ends_with("Audio Transcript Evidence:\n(No relevant audio found)\n"));
    }

    #[test]
    fn test_display_lines() {
        let text = format_evidence_for_display(&bundle());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[frame] 02:05"));
        assert!(lines[2].contains("Maria from Uppsala"));
    }
}
