//! Command-line interface for noughts.

use clap::Parser;
use std::path::PathBuf;

/// Noughts - tic-tac-toe against a heuristic opponent
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Multi-game tic-tac-toe with undo/redo", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to an engine config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fixed seed for the opponent (overrides the config file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print game lists and statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Start with two sample games
    #[arg(long)]
    pub demo: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "noughts=info")]
    pub log: String,
}
