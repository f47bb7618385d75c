//! Shared engine handle with deferred opponent replies.
//!
//! The [`Engine`] wraps a [`GameBook`] behind a mutex and turns every
//! [`FollowUp::OpponentReply`] into a Tokio task that sleeps for the
//! configured delay and then asks the book for the opponent's move. The
//! task re-reads the book when it fires, so a reply scheduled before a
//! reset or undo is simply rejected by the book's own checks.

use crate::{
    EngineConfig, EngineError, FollowUp, Game, GameBook, GameId, GamePatch, GameStats, NewGame,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// A scheduled opponent reply for one game.
#[derive(Debug)]
struct PendingReply {
    ticket: u64,
    handle: AbortHandle,
}

#[derive(Debug)]
struct State {
    book: GameBook,
    pending: HashMap<GameId, PendingReply>,
    next_ticket: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    opponent_delay: Duration,
    tick_interval: Duration,
}

/// Cloneable handle to the engine.
///
/// All operations must run inside a Tokio runtime, since opponent replies
/// and view ticks are spawned as tasks.
#[derive(Debug, Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Creates an engine with the heuristic opponent and system clock.
    #[instrument(skip(config))]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_book(GameBook::new(config), config)
    }

    /// Creates an engine around an existing book.
    #[instrument(skip(book, config))]
    pub fn with_book(book: GameBook, config: &EngineConfig) -> Self {
        info!(
            opponent_delay_ms = config.opponent_delay_ms(),
            tick_interval_ms = config.tick_interval_ms(),
            "Creating engine"
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    book,
                    pending: HashMap::new(),
                    next_ticket: 0,
                }),
                opponent_delay: config.opponent_delay(),
                tick_interval: config.tick_interval(),
            }),
        }
    }

    // Every commit swaps in a whole `Game`, so a poisoned lock still guards
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every game in creation order.
    pub fn games(&self) -> Vec<Game> {
        self.lock().book.games().to_vec()
    }

    /// Snapshot of one game.
    pub fn game(&self, id: GameId) -> Option<Game> {
        self.lock().book.game(id).cloned()
    }

    /// Snapshot of the aggregate counters.
    pub fn stats(&self) -> GameStats {
        *self.lock().book.stats()
    }

    /// Whether an opponent reply is waiting to fire for this game.
    pub fn has_pending_reply(&self, id: GameId) -> bool {
        self.lock().pending.contains_key(&id)
    }

    /// Registers a new game; schedules the opponent's opening move when the
    /// human plays second.
    #[instrument(skip(self, params))]
    pub fn create_game(&self, params: NewGame) -> GameId {
        let mut state = self.lock();
        let (id, follow_up) = state.book.create_game(params);
        self.follow_up(&mut state, id, follow_up);
        id
    }

    /// Human places a mark at square `index` (0-8).
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn apply_human_move(&self, id: GameId, index: usize) -> Result<(), EngineError> {
        let mut state = self.lock();
        let follow_up = state
            .book
            .apply_human_move(id, index)
            .inspect_err(|e| warn!(error = %e, index, "Rejected human move"))?;
        self.follow_up(&mut state, id, follow_up);
        Ok(())
    }

    /// Steps back to the human's previous turn.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn undo(&self, id: GameId) -> Result<(), EngineError> {
        let mut state = self.lock();
        let follow_up = state
            .book
            .undo(id)
            .inspect_err(|e| debug!(error = %e, "Undo ignored"))?;
        Self::cancel_reply(&mut state, id);
        self.follow_up(&mut state, id, follow_up);
        Ok(())
    }

    /// Steps forward along the remembered branch.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn redo(&self, id: GameId) -> Result<(), EngineError> {
        let mut state = self.lock();
        let follow_up = state
            .book
            .redo(id)
            .inspect_err(|e| debug!(error = %e, "Redo ignored"))?;
        Self::cancel_reply(&mut state, id);
        self.follow_up(&mut state, id, follow_up);
        Ok(())
    }

    /// Starts the game over, dropping any reply still in flight.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn reset(&self, id: GameId) -> Result<(), EngineError> {
        let mut state = self.lock();
        let follow_up = state
            .book
            .reset(id)
            .inspect_err(|e| warn!(error = %e, "Reset ignored"))?;
        Self::cancel_reply(&mut state, id);
        self.follow_up(&mut state, id, follow_up);
        Ok(())
    }

    /// Merges a partial update into a game.
    #[instrument(skip(self, patch), fields(game_id = %id))]
    pub fn update_game(&self, id: GameId, patch: GamePatch) -> Result<(), EngineError> {
        self.lock().book.update_game(id, patch).map(|_| ())
    }

    /// Opens a view of a game: restarts the clock if it has not been played
    /// yet, then refreshes its elapsed time on every tick until the returned
    /// guard is dropped.
    #[instrument(skip(self), fields(game_id = %id))]
    pub fn open_view(&self, id: GameId) -> Result<ViewGuard, EngineError> {
        self.lock().book.mark_viewed(id)?;

        let engine = self.clone();
        let period = self.shared.tick_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let ticked = engine.lock().book.tick(id);
                if let Err(e) = ticked {
                    debug!(error = %e, "Stopping view ticker");
                    break;
                }
            }
        });
        debug!("Opened view");
        Ok(ViewGuard { id, task })
    }

    fn follow_up(&self, state: &mut State, id: GameId, follow_up: FollowUp) {
        if follow_up == FollowUp::OpponentReply {
            self.schedule_reply(state, id);
        }
    }

    fn schedule_reply(&self, state: &mut State, id: GameId) {
        Self::cancel_reply(state, id);

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let engine = self.clone();
        let delay = self.shared.opponent_delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.fire_reply(id, ticket);
        });
        state.pending.insert(
            id,
            PendingReply {
                ticket,
                handle: task.abort_handle(),
            },
        );
        debug!(game_id = %id, ticket, ?delay, "Scheduled opponent reply");
    }

    fn cancel_reply(state: &mut State, id: GameId) {
        if let Some(pending) = state.pending.remove(&id) {
            pending.handle.abort();
            debug!(game_id = %id, ticket = pending.ticket, "Cancelled opponent reply");
        }
    }

    #[instrument(skip(self))]
    fn fire_reply(&self, id: GameId, ticket: u64) {
        let mut state = self.lock();
        if state.pending.get(&id).map(|p| p.ticket) != Some(ticket) {
            debug!("Dropping superseded opponent reply");
            return;
        }
        state.pending.remove(&id);
        match state.book.apply_opponent_move(id) {
            Ok(pos) => debug!(%pos, "Opponent reply applied"),
            Err(e) => debug!(error = %e, "Dropping stale opponent reply"),
        }
    }
}

/// Keeps a game's elapsed time ticking while it is on screen.
///
/// Dropping the guard stops the ticker.
#[derive(Debug)]
pub struct ViewGuard {
    id: GameId,
    task: JoinHandle<()>,
}

impl ViewGuard {
    /// The game being viewed.
    pub fn id(&self) -> GameId {
        self.id
    }
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        self.task.abort();
        debug!(game_id = %self.id, "Closed view");
    }
}
