//! Engine tests on paused Tokio time.

use chrono::{DateTime, TimeDelta, Utc};
use noughts::{
    Clock, Engine, EngineConfig, EngineErrorKind, GameBook, GameId, GameStatus, HeuristicOpponent,
    Mark, NewGame, RedoStatus, Square,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Wall clock driven by Tokio's (pausable) clock.
#[derive(Debug)]
struct TokioClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    fn new() -> Self {
        Self {
            base: DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp"),
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(Instant::now() - self.origin).expect("elapsed fits");
        self.base + elapsed
    }
}

fn config() -> EngineConfig {
    EngineConfig::default().with_seed(11)
}

fn engine() -> Engine {
    let config = config();
    let book = GameBook::with_parts(
        Box::new(HeuristicOpponent::from_seed(*config.seed())),
        Arc::new(TokioClock::new()),
        RedoStatus::AlwaysIncomplete,
    );
    Engine::with_book(book, &config)
}

fn player(start_first: bool) -> NewGame {
    NewGame::new("Rohan".into(), 14, "rohang@gmail.com".into(), start_first)
}

async fn wait_for_reply() {
    tokio::time::sleep(config().opponent_delay() + Duration::from_millis(10)).await;
}

fn count(engine: &Engine, id: GameId, mark: Mark) -> usize {
    let game = engine.game(id).expect("game exists");
    game.board()
        .squares()
        .iter()
        .filter(|sq| **sq == Square::Occupied(mark))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_reply_follows_human_move() {
    let engine = engine();
    let id = engine.create_game(player(true));
    assert!(!engine.has_pending_reply(id));

    engine.apply_human_move(id, 0).expect("legal move");
    let game = engine.game(id).expect("game exists");
    assert_eq!(game.board().squares()[0], Square::Occupied(Mark::X));
    assert!(!*game.player_x_turn());
    assert!(engine.has_pending_reply(id));
    assert_eq!(count(&engine, id, Mark::O), 0);

    wait_for_reply().await;
    assert!(!engine.has_pending_reply(id));
    assert_eq!(count(&engine, id, Mark::O), 1);
    assert!(*engine.game(id).expect("game exists").player_x_turn());
}

#[tokio::test(start_paused = true)]
async fn test_opponent_opens_when_human_second() {
    let engine = engine();
    let id = engine.create_game(player(false));
    assert!(engine.has_pending_reply(id));

    wait_for_reply().await;
    let game = engine.game(id).expect("game exists");
    assert_eq!(count(&engine, id, Mark::X), 1);
    assert!(game.is_human_turn());
    assert_eq!(*game.status(), GameStatus::Incomplete);
}

#[tokio::test(start_paused = true)]
async fn test_move_while_reply_pending_is_rejected() {
    let engine = engine();
    let id = engine.create_game(player(true));
    engine.apply_human_move(id, 4).expect("legal move");

    let err = engine.apply_human_move(id, 0).expect_err("opponent to move");
    assert_eq!(err.kind, EngineErrorKind::NotYourTurn);
    assert_eq!(count(&engine, id, Mark::X), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_drops_pending_reply() {
    let engine = engine();
    let id = engine.create_game(player(true));
    engine.apply_human_move(id, 0).expect("legal move");
    engine.reset(id).expect("game exists");
    assert!(!engine.has_pending_reply(id));

    wait_for_reply().await;
    let game = engine.game(id).expect("game exists");
    assert_eq!(*game.status(), GameStatus::Unstarted);
    assert_eq!(game.board().filled_count(), 0);
    assert_eq!(game.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_undo_drops_pending_reply() {
    let engine = engine();
    let id = engine.create_game(player(true));
    engine.apply_human_move(id, 0).expect("legal move");
    engine.undo(id).expect("one ply to undo");

    wait_for_reply().await;
    let game = engine.game(id).expect("game exists");
    assert_eq!(game.board().filled_count(), 0);
    assert!(game.is_human_turn());
    assert!(game.can_redo());
}

#[tokio::test(start_paused = true)]
async fn test_reset_when_second_schedules_new_opening() {
    let engine = engine();
    let id = engine.create_game(player(false));
    wait_for_reply().await;
    engine.apply_human_move(id, engine_open_square(&engine, id)).expect("legal move");

    engine.reset(id).expect("game exists");
    assert!(engine.has_pending_reply(id));
    wait_for_reply().await;
    assert_eq!(engine.game(id).expect("game exists").board().filled_count(), 1);
}

fn engine_open_square(engine: &Engine, id: GameId) -> usize {
    engine.game(id).expect("game exists").open_squares()[0].to_index()
}

#[tokio::test(start_paused = true)]
async fn test_full_game_updates_stats() {
    let engine = engine();
    let id = engine.create_game(player(true));

    while !engine.game(id).expect("game exists").is_over() {
        engine.apply_human_move(id, engine_open_square(&engine, id)).expect("legal move");
        wait_for_reply().await;
    }

    let game = engine.game(id).expect("game exists");
    assert_eq!(*game.status(), GameStatus::Complete);
    assert!(game.end_time().is_some());
    let stats = engine.stats();
    assert_eq!(*stats.total_games(), 1);
    assert_eq!(stats.games_won() + stats.games_lost(), 1);

    engine.reset(id).expect("game exists");
    let stats = engine.stats();
    assert_eq!(stats.games_won() + stats.games_lost(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_view_ticks_until_dropped() {
    let engine = engine();
    let id = engine.create_game(player(true));

    let view = engine.open_view(id).expect("game exists");
    assert_eq!(view.id(), id);
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(
        *engine.game(id).expect("game exists").total_time(),
        TimeDelta::seconds(3)
    );

    drop(view);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        *engine.game(id).expect("game exists").total_time(),
        TimeDelta::seconds(3)
    );
}

#[tokio::test(start_paused = true)]
async fn test_view_of_unknown_game_is_rejected() {
    let engine = engine();
    let err = engine.open_view(GameId::from(5)).expect_err("no such game");
    assert_eq!(err.kind, EngineErrorKind::UnknownGame(GameId::from(5)));
}

#[tokio::test(start_paused = true)]
async fn test_games_are_independent() {
    let engine = engine();
    let first = engine.create_game(player(true));
    let second = engine.create_game(player(true));

    engine.apply_human_move(first, 0).expect("legal move");
    wait_for_reply().await;

    let untouched = engine.game(second).expect("game exists");
    assert_eq!(*untouched.status(), GameStatus::Unstarted);
    assert_eq!(untouched.board().filled_count(), 0);
    assert_eq!(engine.games().len(), 2);
}
