//! Aggregate win/loss counters.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Aggregate counters across all games, from the human's point of view.
///
/// Counters move only when a game crosses into or out of `complete`; a
/// draw counts as a loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameStats {
    /// Games created.
    total_games: u32,
    /// Completed games the human won.
    games_won: u32,
    /// Completed games the human lost or drew.
    games_lost: u32,
}

impl GameStats {
    /// Creates zeroed counters.
    pub const fn new() -> Self {
        Self {
            total_games: 0,
            games_won: 0,
            games_lost: 0,
        }
    }

    pub(crate) fn record_created(&mut self) {
        self.total_games += 1;
    }

    pub(crate) fn record_completion(&mut self, human_won: bool) {
        if human_won {
            self.games_won += 1;
        } else {
            self.games_lost += 1;
        }
        debug!(stats = ?self, human_won, "Recorded completed game");
    }

    pub(crate) fn revert_completion(&mut self, human_won: bool) {
        if human_won {
            self.games_won = self.games_won.saturating_sub(1);
        } else {
            self.games_lost = self.games_lost.saturating_sub(1);
        }
        debug!(stats = ?self, human_won, "Reverted completed game");
    }
}
