//! Noughts - a multi-session tic-tac-toe engine.
//!
//! Tracks any number of independent games against a heuristic opponent,
//! each with its own board, branching undo/redo history, turn state, and
//! play clock.
//!
//! # Architecture
//!
//! - **Rules** ([`noughts_rules`]): board types, win detection, and the
//!   fixed-priority opponent.
//! - **Book** ([`GameBook`]): the synchronous registry and state machine,
//!   and the only writer of game state.
//! - **Engine** ([`Engine`]): shared handle that schedules the opponent's
//!   deferred replies and the per-view elapsed-time ticker on Tokio.
//!
//! # Example
//!
//! ```no_run
//! use noughts::{Engine, EngineConfig, NewGame};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Engine::new(&EngineConfig::default());
//! let id = engine.create_game(NewGame::new("Rohan".into(), 14, "rohang@gmail.com".into(), true));
//! engine.apply_human_move(id, 4)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod book;
mod clock;
mod config;
mod engine;
mod error;
mod game;
mod opponent;
mod stats;

// Crate-level exports - State machine
pub use book::{FollowUp, GameBook};

// Crate-level exports - Engine handle
pub use engine::{Engine, ViewGuard};

// Crate-level exports - Game records
pub use game::{Game, GameId, GamePatch, GameStatus, NewGame, Outcome, format_elapsed, list_time};
pub use stats::GameStats;

// Crate-level exports - Collaborators
pub use clock::{Clock, SystemClock};
pub use opponent::{HeuristicOpponent, Opponent};

// Crate-level exports - Configuration and errors
pub use config::{ConfigError, EngineConfig, RedoStatus};
pub use error::{EngineError, EngineErrorKind};

// Crate-level exports - Rules
pub use noughts_rules::{Board, Mark, Position, Square};
