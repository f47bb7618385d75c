//! Noughts - terminal front end
//!
//! Line-oriented presentation layer over the noughts engine.

#![warn(missing_docs)]

mod cli;
mod form;
mod repl;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use noughts::{Engine, EngineConfig, NewGame};
use repl::Repl;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NOUGHTS_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new(&cli.log)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let engine = Engine::new(&config);
    if cli.demo {
        seed_demo_games(&engine);
    }

    info!("Starting noughts");
    Repl::new(engine, config.opponent_delay(), cli.json)
        .run()
        .await
}

/// Reads the config file if one was given, then applies CLI overrides.
#[instrument(skip(cli))]
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    Ok(match cli.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

/// One game where the player opens and one where the opponent does.
#[instrument(skip(engine))]
fn seed_demo_games(engine: &Engine) {
    engine.create_game(NewGame::new(
        "Rupesh".to_string(),
        12,
        "rupeshg@gmail.com".to_string(),
        true,
    ));
    engine.create_game(NewGame::new(
        "Rohan".to_string(),
        14,
        "rohang@gmail.com".to_string(),
        false,
    ));
}
