//! CLI module for Glimt.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Glimt - ask questions about a video
///
/// Indexes a video's keyframes and speech, then retrieves timestamped evidence
/// from both and answers questions with it.
#[derive(Parser, Debug)]
#[command(name = "glimt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the keyframe and transcript indices of a video
    Index {
        /// Video file
        video: PathBuf,
    },

    /// Index a video and print the evidence for a query
    Search {
        /// Video file
        video: PathBuf,

        /// Search query
        query: String,

        /// Keyframes to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Transcript segments to retrieve
        #[arg(long)]
        k_audio: Option<usize>,
    },

    /// Index a video and answer a question about it
    Ask {
        /// Video file
        video: PathBuf,

        /// The question to ask
        question: String,

        /// Chat model used to write the answer
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Index a video once, then answer questions interactively
    Chat {
        /// Video file
        video: PathBuf,

        /// Chat model used to write the answers
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
