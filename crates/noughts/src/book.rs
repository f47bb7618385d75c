//! Game registry and state machine.
//!
//! [`GameBook`] is the single writer of game state. Every operation
//! validates first and then commits one merged [`Game`] value through
//! [`GameBook::update_game`], so a rejected operation leaves nothing behind
//! and the win/loss counters only ever move in that one place.
//!
//! The book never waits. When a committed transition leaves the opponent to
//! move in an unfinished game, it returns [`FollowUp::OpponentReply`] and the
//! caller decides when to invoke [`GameBook::apply_opponent_move`].

use crate::{
    Clock, EngineConfig, EngineError, EngineErrorKind, Game, GameId, GamePatch, GameStats,
    GameStatus, HeuristicOpponent, NewGame, Opponent, RedoStatus, SystemClock,
};
use chrono::TimeDelta;
use noughts_rules::{Board, Mark, Position, check_winner, is_full};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What the caller must do after a committed transition.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Nothing; the human is to move or the game is over.
    Idle,
    /// The opponent is to move; schedule one reply.
    OpponentReply,
}

impl FollowUp {
    fn after(game: &Game) -> Self {
        if !game.is_over() && !game.is_human_turn() {
            FollowUp::OpponentReply
        } else {
            FollowUp::Idle
        }
    }
}

/// Owns every game and the aggregate counters.
#[derive(Debug)]
pub struct GameBook {
    games: Vec<Game>,
    stats: GameStats,
    next_id: u64,
    opponent: Box<dyn Opponent>,
    clock: Arc<dyn Clock>,
    redo_status: RedoStatus,
}

impl GameBook {
    /// Creates an empty book with the heuristic opponent and system clock.
    #[instrument(skip(config))]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_parts(
            Box::new(HeuristicOpponent::from_seed(*config.seed())),
            Arc::new(SystemClock),
            *config.redo_status(),
        )
    }

    /// Creates an empty book from explicit collaborators.
    pub fn with_parts(
        opponent: Box<dyn Opponent>,
        clock: Arc<dyn Clock>,
        redo_status: RedoStatus,
    ) -> Self {
        Self {
            games: Vec::new(),
            stats: GameStats::new(),
            next_id: 1,
            opponent,
            clock,
            redo_status,
        }
    }

    /// All games in creation order.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Looks up one game.
    pub fn game(&self, id: GameId) -> Option<&Game> {
        self.games.iter().find(|g| *g.id() == id)
    }

    /// Aggregate counters.
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[track_caller]
    fn find(&self, id: GameId) -> Result<&Game, EngineError> {
        match self.game(id) {
            Some(game) => Ok(game),
            None => Err(EngineError::new(EngineErrorKind::UnknownGame(id))),
        }
    }

    /// Registers a new game and returns its id.
    #[instrument(skip(self, params), fields(player = %params.player_name(), start_first = params.start_first()))]
    pub fn create_game(&mut self, params: NewGame) -> (GameId, FollowUp) {
        let id = GameId::from(self.next_id);
        self.next_id += 1;

        let game = Game::new(id, params, self.clock.now());
        let follow_up = FollowUp::after(&game);
        self.games.push(game);
        self.stats.record_created();

        info!(game_id = %id, ?follow_up, "Created game");
        (id, follow_up)
    }

    /// Merges `patch` over the game and commits it.
    ///
    /// Crossing into `complete` records a win or loss for the human;
    /// crossing out of it takes that result back. A patch that would leave
    /// the game inconsistent (see [`Game::is_consistent`]) is rejected and
    /// nothing changes.
    #[instrument(skip(self, patch), fields(game_id = %id))]
    pub fn update_game(&mut self, id: GameId, patch: GamePatch) -> Result<&Game, EngineError> {
        let slot = self
            .games
            .iter()
            .position(|g| *g.id() == id)
            .ok_or_else(|| EngineError::new(EngineErrorKind::UnknownGame(id)))?;

        let prior = &self.games[slot];
        let was_complete = *prior.status() == GameStatus::Complete;
        let prior_won = prior.human_won();
        let next = prior.merged(patch);
        if !next.is_consistent() {
            warn!(
                current_move = next.current_move(),
                history_len = next.history().len(),
                "Rejected inconsistent patch"
            );
            return Err(EngineError::new(EngineErrorKind::InconsistentPatch));
        }
        let is_complete = *next.status() == GameStatus::Complete;

        match (was_complete, is_complete) {
            (false, true) => {
                self.stats.record_completion(next.human_won());
                info!(outcome = ?next.outcome(), winner = ?next.winner(), "Game completed");
            }
            (true, false) => {
                self.stats.revert_completion(prior_won);
                info!(status = %next.status(), "Game left completed state");
            }
            _ => {}
        }

        debug!(status = %next.status(), current_move = next.current_move(), "Committed game");
        self.games[slot] = next;
        Ok(&self.games[slot])
    }

    /// Places the human's mark at square `index` (0-8).
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn apply_human_move(&mut self, id: GameId, index: usize) -> Result<FollowUp, EngineError> {
        let game = self.find(id)?;
        let pos = Position::from_index(index)
            .ok_or_else(|| EngineError::new(EngineErrorKind::OutOfBounds(index)))?;
        if !game.board().is_empty(pos) {
            return Err(EngineError::new(EngineErrorKind::SquareOccupied(pos)));
        }
        if game.winner().is_some() {
            return Err(EngineError::new(EngineErrorKind::GameOver));
        }
        if !game.is_human_turn() {
            return Err(EngineError::new(EngineErrorKind::NotYourTurn));
        }

        let patch = self.placement(game, pos, game.human_mark(), !*game.player_x_turn());
        let game = self.update_game(id, patch)?;
        info!(%pos, mark = %game.human_mark(), "Human moved");
        Ok(FollowUp::after(game))
    }

    /// Lets the opponent play one square, re-validating the game first.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn apply_opponent_move(&mut self, id: GameId) -> Result<Position, EngineError> {
        let game = self.find(id)?.clone();
        if game.is_over() {
            return Err(EngineError::new(EngineErrorKind::GameOver));
        }
        if game.is_human_turn() {
            return Err(EngineError::new(EngineErrorKind::NotYourTurn));
        }

        let mark = game.opponent_mark();
        let board = *game.board();
        let pos = self
            .opponent
            .choose(&board, mark)
            .filter(|pos| board.is_empty(*pos))
            .ok_or_else(|| EngineError::new(EngineErrorKind::NoMoveAvailable))?;

        // X always opens, so X is to move whenever an even number of squares is filled.
        let x_next = (board.filled_count() + 1) % 2 == 0;
        let patch = self.placement(&game, pos, mark, x_next);
        self.update_game(id, patch)?;
        info!(%pos, %mark, "Opponent moved");
        Ok(pos)
    }

    fn placement(&self, game: &Game, pos: Position, mark: Mark, player_x_turn: bool) -> GamePatch {
        let board = game.board().with_mark(pos, mark);
        let winner = check_winner(&board);
        let ending = winner.is_some() || is_full(&board);

        let mut history = game.history()[..=*game.current_move()].to_vec();
        history.push(board);
        let current_move = history.len() - 1;

        let now = self.clock.now();
        GamePatch::default()
            .with_board(board)
            .with_player_x_turn(player_x_turn)
            .with_winner(winner)
            .with_history(history)
            .with_current_move(current_move)
            .with_status(if ending {
                GameStatus::Complete
            } else {
                GameStatus::Incomplete
            })
            .with_end_time(ending.then_some(now))
            .with_total_time(now - *game.start_time())
    }

    /// Restores `history[target]`; X is to move on even plies whoever opened.
    fn snapshot(game: &Game, target: usize) -> (Board, GamePatch) {
        let board = game.history()[target];
        let patch = GamePatch::default()
            .with_board(board)
            .with_current_move(target)
            .with_player_x_turn(target % 2 == 0);
        (board, patch)
    }

    /// Steps back two plies (or to the start), returning the turn to the
    /// side that was to move there.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn undo(&mut self, id: GameId) -> Result<FollowUp, EngineError> {
        let game = self.find(id)?;
        let current = *game.current_move();
        if current == 0 {
            return Err(EngineError::new(EngineErrorKind::NothingToUndo));
        }

        let target = current.saturating_sub(2);
        let (_, patch) = Self::snapshot(game, target);
        let patch = patch
            .with_winner(None)
            .with_status(GameStatus::Incomplete)
            .with_end_time(None);
        let game = self.update_game(id, patch)?;
        info!(from = current, to = target, "Undid moves");
        Ok(FollowUp::after(game))
    }

    /// Steps forward two plies along the remembered branch.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn redo(&mut self, id: GameId) -> Result<FollowUp, EngineError> {
        let game = self.find(id)?;
        let current = *game.current_move();
        let last = game.history().len() - 1;
        if current + 2 > last {
            return Err(EngineError::new(EngineErrorKind::NothingToRedo));
        }

        let target = (current + 2).min(last);
        let (board, patch) = Self::snapshot(game, target);
        let winner = check_winner(&board);
        let ending = winner.is_some() || is_full(&board);
        let patch = match self.redo_status {
            RedoStatus::AlwaysIncomplete => patch.with_status(GameStatus::Incomplete),
            RedoStatus::Recompute if ending => patch
                .with_status(GameStatus::Complete)
                .with_end_time(Some(self.clock.now())),
            RedoStatus::Recompute => patch.with_status(GameStatus::Incomplete),
        }
        .with_winner(winner);

        let game = self.update_game(id, patch)?;
        info!(from = current, to = target, status = %game.status(), "Redid moves");
        Ok(FollowUp::after(game))
    }

    /// Clears the board and history, keeping the player's details.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn reset(&mut self, id: GameId) -> Result<FollowUp, EngineError> {
        self.find(id)?;
        let now = self.clock.now();
        let patch = GamePatch::default()
            .with_board(Board::new())
            .with_player_x_turn(true)
            .with_winner(None)
            .with_history(vec![Board::new()])
            .with_current_move(0)
            .with_status(GameStatus::Unstarted)
            .with_start_time(now)
            .with_end_time(None)
            .with_total_time(TimeDelta::zero());
        let game = self.update_game(id, patch)?;
        info!("Reset game");
        Ok(FollowUp::after(game))
    }

    /// Restarts the clock of a game that nobody has played yet.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn mark_viewed(&mut self, id: GameId) -> Result<(), EngineError> {
        if *self.find(id)?.status() == GameStatus::Unstarted {
            let now = self.clock.now();
            self.update_game(id, GamePatch::default().with_start_time(now))?;
        }
        Ok(())
    }

    /// Refreshes the elapsed time of an unfinished game.
    ///
    /// Completed games keep the time recorded when they ended.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn tick(&mut self, id: GameId) -> Result<TimeDelta, EngineError> {
        let game = self.find(id)?;
        if *game.status() == GameStatus::Complete {
            return Ok(*game.total_time());
        }
        let elapsed = self.clock.now() - *game.start_time();
        let game = self.update_game(id, GamePatch::default().with_total_time(elapsed))?;
        Ok(*game.total_time())
    }
}
