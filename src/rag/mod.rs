//! Answer synthesis over retrieved evidence.

pub mod context;
mod response;

pub use context::{format_evidence_for_display, format_evidence_for_prompt};
pub use response::OpenAISynthesizer;

use crate::error::Result;
use crate::retrieval::EvidenceBundle;
use async_trait::async_trait;

/// Trait for models that write an answer from evidence.
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Answer `query` from `evidence`. The model output is returned as is.
    async fn answer(&self, query: &str, evidence: &EvidenceBundle) -> Result<String>;
}

/// An answer with the evidence it was written from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub evidence: EvidenceBundle,
}

impl Answer {
    /// Format the answer followed by its sources.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.clone();

        if !self.evidence.is_empty() {
            output.push_str("\n\n--- Evidence ---\n");
            output.push_str(&format_evidence_for_display(&self.evidence));
        }

        output
    }
}
