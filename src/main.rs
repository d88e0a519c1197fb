//! Glimt CLI entry point.

use anyhow::Result;
use clap::Parser;
use glimt::cli::{commands, Cli, Commands};
use glimt::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = commands::resolve_config_path(cli.config.as_deref());
    let settings = Settings::load_from(config_path.as_ref())?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("glimt={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Index { video } => {
            commands::run_index(video, settings).await?;
        }

        Commands::Search {
            video,
            query,
            k,
            k_audio,
        } => {
            commands::run_search(video, query, *k, *k_audio, settings).await?;
        }

        Commands::Ask {
            video,
            question,
            model,
        } => {
            commands::run_ask(video, question, model.clone(), settings).await?;
        }

        Commands::Chat { video, model } => {
            commands::run_chat(video, model.clone(), settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
