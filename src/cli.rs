//! Command-line interface for strictly_othello.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strictly_othello::{Difficulty, GameMode, Player};

/// Strictly Othello - Othello client with a branching move tree
#[derive(Parser, Debug)]
#[command(name = "strictly_othello")]
#[command(about = "Play and analyse Othello against a remote move service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Move service URL (overrides config and environment)
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    /// Save database path (overrides config and environment)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Game mode: human-vs-human or human-vs-ai
        #[arg(long)]
        mode: Option<GameMode>,

        /// Side the human plays against the AI: black or white
        #[arg(long)]
        side: Option<Player>,

        /// AI difficulty: easy, medium or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Continue from the autosave instead of starting a new game
        #[arg(long)]
        resume: bool,
    },

    /// List named saves
    Saves,

    /// Print the main line of an analysis file as a linear record
    Record {
        /// Analysis file to read
        input: PathBuf,

        /// Write the record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
