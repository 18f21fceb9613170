//! Strictly Othello - terminal client
//!
//! Plays Othello against a remote move service, keeping every explored line.

#![warn(missing_docs)]

mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use strictly_othello::{ClientConfig, HttpMoveService, LinearRecord, SaveStore, Snapshot};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.service_url {
        config = config.with_service_url(url);
    }
    if let Some(path) = cli.db_path {
        config = config.with_database_path(path);
    }

    match cli.command {
        Command::Play {
            mode,
            side,
            difficulty,
            resume,
        } => {
            let mut settings = config.game_settings();
            if let Some(mode) = mode {
                settings = settings.with_mode(mode);
            }
            if let Some(side) = side {
                settings = settings.with_human_side(side);
            }
            if let Some(difficulty) = difficulty {
                settings = settings.with_difficulty(difficulty);
            }
            run_play(config, settings, resume).await
        }
        Command::Saves => terminal::print_saves(&open_store(&config)?),
        Command::Record { input, output } => run_record(&input, output.as_deref()),
    }
}

/// Opens the save database named by the config.
fn open_store(config: &ClientConfig) -> Result<SaveStore> {
    let path = config.database_path().to_string_lossy().into_owned();
    SaveStore::open(path).context("Failed to open the save database")
}

/// Runs the interactive terminal session.
#[instrument(skip(config))]
async fn run_play(
    config: ClientConfig,
    settings: strictly_othello::GameSettings,
    resume: bool,
) -> Result<()> {
    info!(service_url = %config.service_url(), "Starting terminal session");
    let store = open_store(&config)?;
    let service = HttpMoveService::new(config.service_url());
    terminal::run(service, store, &config, settings, resume).await
}

/// Converts an analysis file into a linear record.
#[instrument]
fn run_record(input: &std::path::Path, output: Option<&std::path::Path>) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let game = Snapshot::parse(&text)?;
    let record = LinearRecord::from_tree(game.tree(), *game.settings()).to_notation();
    match output {
        Some(path) => std::fs::write(path, record)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{record}"),
    }
    Ok(())
}
