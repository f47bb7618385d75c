//! Game records and the patches that replace them.

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use derive_new::new;
use derive_setters::Setters;
use noughts_rules::{Board, Mark, Position, check_winner, is_draw, is_full};
use serde::{Deserialize, Serialize};

/// Unique identifier for a game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct GameId(u64);

impl std::str::FromStr for GameId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GameId)
    }
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// No move played yet.
    #[display("unstarted")]
    Unstarted,
    /// At least one move played, no result yet.
    #[display("incomplete")]
    Incomplete,
    /// Won or drawn.
    #[display("complete")]
    Complete,
}

/// How a game stands from the human's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No winner and open squares remain.
    InProgress,
    /// The human completed a line.
    HumanWon,
    /// The opponent completed a line.
    OpponentWon,
    /// Full board, no line.
    Draw,
}

/// Validated parameters for a new game, as supplied by the form layer.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new, Serialize, Deserialize)]
pub struct NewGame {
    /// Player's display name.
    player_name: String,
    /// Player's age in years.
    age: u8,
    /// Player's email address.
    email: String,
    /// Whether the human plays X and moves first.
    start_first: bool,
}

/// One played or in-progress match.
///
/// A `Game` is never edited in place by the engine: every operation builds
/// a [`GamePatch`] and swaps in the merged value.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Game {
    /// Identifier assigned at creation.
    id: GameId,
    /// Player's display name.
    player_name: String,
    /// Player's age in years.
    age: u8,
    /// Player's email address.
    email: String,
    /// Human plays X and moves first.
    start_first: bool,
    /// The active board, always equal to `history[current_move]`.
    board: Board,
    /// X is to move next.
    player_x_turn: bool,
    /// Mark holding a completed line on `board`, if any.
    winner: Option<Mark>,
    /// Board after each ply; entry 0 is the empty board.
    history: Vec<Board>,
    /// Index of the active snapshot in `history`.
    current_move: usize,
    /// Lifecycle status.
    status: GameStatus,
    /// When the clock started.
    start_time: DateTime<Utc>,
    /// When the game completed.
    end_time: Option<DateTime<Utc>>,
    /// Elapsed play time.
    #[serde(with = "elapsed_ms")]
    total_time: TimeDelta,
}

impl Game {
    /// Creates a fresh game with an empty board.
    pub fn new(id: GameId, params: NewGame, now: DateTime<Utc>) -> Self {
        let NewGame {
            player_name,
            age,
            email,
            start_first,
        } = params;
        Self {
            id,
            player_name,
            age,
            email,
            start_first,
            board: Board::new(),
            player_x_turn: true,
            winner: None,
            history: vec![Board::new()],
            current_move: 0,
            status: GameStatus::Unstarted,
            start_time: now,
            end_time: None,
            total_time: TimeDelta::zero(),
        }
    }

    /// Returns a copy with the patch applied over this game.
    pub fn merged(&self, patch: GamePatch) -> Self {
        let GamePatch {
            board,
            player_x_turn,
            winner,
            history,
            current_move,
            status,
            start_time,
            end_time,
            total_time,
        } = patch;
        Self {
            board: board.unwrap_or(self.board),
            player_x_turn: player_x_turn.unwrap_or(self.player_x_turn),
            winner: winner.unwrap_or(self.winner),
            history: history.unwrap_or_else(|| self.history.clone()),
            current_move: current_move.unwrap_or(self.current_move),
            status: status.unwrap_or(self.status),
            start_time: start_time.unwrap_or(self.start_time),
            end_time: end_time.unwrap_or(self.end_time),
            total_time: total_time.unwrap_or(self.total_time),
            ..self.clone()
        }
    }

    /// The human's mark: X when moving first, otherwise O.
    pub fn human_mark(&self) -> Mark {
        if self.start_first { Mark::X } else { Mark::O }
    }

    /// The opponent plays whichever mark the human did not get.
    pub fn opponent_mark(&self) -> Mark {
        self.human_mark().opponent()
    }

    /// Mark whose turn it is.
    pub fn mark_to_move(&self) -> Mark {
        if self.player_x_turn { Mark::X } else { Mark::O }
    }

    /// True when the human is to move.
    pub fn is_human_turn(&self) -> bool {
        self.player_x_turn == (self.human_mark() == Mark::X)
    }

    /// Full board with no winner.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none() && is_draw(&self.board)
    }

    /// Winner present or board full.
    pub fn is_over(&self) -> bool {
        self.winner.is_some() || is_full(&self.board)
    }

    /// Whether undo would move back.
    pub fn can_undo(&self) -> bool {
        self.current_move > 0
    }

    /// Whether there is history ahead of the active snapshot.
    pub fn can_redo(&self) -> bool {
        self.current_move + 1 < self.history.len()
    }

    /// Result from the human's point of view.
    pub fn outcome(&self) -> Outcome {
        match self.winner {
            Some(mark) if mark == self.human_mark() => Outcome::HumanWon,
            Some(_) => Outcome::OpponentWon,
            None if is_full(&self.board) => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    /// Whether a finished game counts as a win for the human.
    pub(crate) fn human_won(&self) -> bool {
        self.winner == Some(self.human_mark())
    }

    /// Whether the board, history cursor, winner and turn agree.
    ///
    /// Entry `i` of the history holds exactly `i` marks, the board is the
    /// entry under the cursor, and X moves on even plies.
    pub fn is_consistent(&self) -> bool {
        let Some(active) = self.history.get(self.current_move) else {
            return false;
        };
        *active == self.board
            && self.winner == check_winner(&self.board)
            && self.player_x_turn == (self.board.filled_count() % 2 == 0)
            && self
                .history
                .iter()
                .enumerate()
                .all(|(ply, board)| board.filled_count() == ply)
    }

    /// Empty squares on the active board.
    pub fn open_squares(&self) -> Vec<Position> {
        Position::valid_moves(&self.board)
    }
}

/// Partial update merged over a [`Game`].
///
/// Unset fields keep the game's current value. Identity fields (id, player
/// details, `start_first`) cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct GamePatch {
    /// Replacement board.
    pub board: Option<Board>,
    /// Replacement turn flag.
    pub player_x_turn: Option<bool>,
    /// Replacement winner (`Some(None)` clears it).
    pub winner: Option<Option<Mark>>,
    /// Replacement history.
    pub history: Option<Vec<Board>>,
    /// Replacement history cursor.
    pub current_move: Option<usize>,
    /// Replacement status.
    pub status: Option<GameStatus>,
    /// Replacement start time.
    pub start_time: Option<DateTime<Utc>>,
    /// Replacement end time (`Some(None)` clears it).
    pub end_time: Option<Option<DateTime<Utc>>>,
    /// Replacement elapsed time.
    pub total_time: Option<TimeDelta>,
}

/// Formats elapsed time as `MM:SS`.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Game time for a list row; unstarted games always read `00:00`.
pub fn list_time(game: &Game) -> String {
    match game.status {
        GameStatus::Unstarted => format_elapsed(TimeDelta::zero()),
        _ => format_elapsed(game.total_time),
    }
}

mod elapsed_ms {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        i64::deserialize(deserializer).map(TimeDelta::milliseconds)
    }
}
