//! The opponent seam used by the game book.

use noughts_rules::{Board, Mark, Position, select_move};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use tracing::instrument;

/// Chooses the opponent's square for a board.
///
/// Returning `None` means there is no legal move; the engine treats it as a
/// no-op.
pub trait Opponent: Send + fmt::Debug {
    /// Picks a square for `mark` on `board`.
    fn choose(&mut self, board: &Board, mark: Mark) -> Option<Position>;
}

/// Fixed-priority heuristic opponent with an owned random source.
#[derive(Debug, Clone)]
pub struct HeuristicOpponent<R = StdRng> {
    rng: R,
}

impl HeuristicOpponent<StdRng> {
    /// Seeds from `seed` when given, otherwise from the OS.
    #[instrument]
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl<R: Rng> HeuristicOpponent<R> {
    /// Uses the given random source for corner and side picks.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + fmt::Debug> Opponent for HeuristicOpponent<R> {
    fn choose(&mut self, board: &Board, mark: Mark) -> Option<Position> {
        select_move(board, mark, &mut self.rng)
    }
}
