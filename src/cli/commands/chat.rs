//! Interactive question loop over one indexed video.

use super::build_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Run the chat command.
pub async fn run_chat(video: &Path, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Some(model) = model {
        settings.answer.model = model;
    }

    let orchestrator = build_orchestrator(video, settings).await?;

    Output::header("Glimt Chat");
    println!("Ask questions about {}. Type 'exit' or 'quit' to leave.\n", video.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(format!("{} ", style("you>").cyan().bold()).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let result = orchestrator.ask(question).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => println!("\n{}\n", answer.format_for_display()),
            Err(e) => Output::error(&format!("{}", e)),
        }
    }

    Output::info("Goodbye!");
    Ok(())
}

fn is_exit_command(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit")
}
