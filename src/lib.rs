//! Glimt - multimodal question answering over a single video
//!
//! Glimt indexes what a video shows and what is said in it, then answers
//! questions with timestamped evidence from both.
//!
//! # Overview
//!
//! - Keyframes are sampled at a fixed rate and kept only at shot changes,
//!   then embedded in a joint image/text space.
//! - The audio track is transcribed in chunks with timestamps rebased onto the
//!   whole video. Transcripts are cached on disk by a fingerprint of the input.
//! - A query searches both indices concurrently and the hits are fused into an
//!   evidence bundle that an answer model writes from.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `video` - Frame decoding, shot detection and keyframe extraction
//! - `audio` - Audio track extraction and chunking
//! - `transcription` - Speech-to-text, chunk reassembly and the transcript cache
//! - `embedding` - Image and text embedding
//! - `vector_store` - Exact and graph nearest-neighbour indices
//! - `retrieval` - Per-modality retrievers and evidence fusion
//! - `rag` - Answer synthesis
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use glimt::config::Settings;
//! use glimt::orchestrator::Orchestrator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.build(Path::new("lecture.mp4")).await;
//!     println!("{} keyframes, {} segments", report.keyframes(), report.segments());
//!
//!     let answer = orchestrator.ask("Which universities are mentioned?").await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
mod ffmpeg;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod transcription;
pub mod vector_store;
pub mod video;

#[cfg(test)]
mod testing;

pub use error::{GlimtError, Result};
