//! Per-modality retrievers and evidence fusion.
//!
//! Each retriever owns one vector index plus the records it points at, and is
//! rebuilt from scratch for every video.

pub mod audio;
pub mod fusion;
pub mod visual;

pub use audio::{AudioBuildStats, AudioHit, AudioIndex, AudioRetriever, AudioSegmentRecord};
pub use fusion::{
    excerpt, format_timestamp, AudioEvidence, EvidenceBundle, EvidenceFusion, VisualEvidence,
};
pub use visual::{KeyframeRecord, VideoRetriever, VisualHit, VisualIndex};
