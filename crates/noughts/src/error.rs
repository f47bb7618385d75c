//! Engine error types.

use crate::GameId;
use derive_more::{Display, Error};
use noughts_rules::Position;
use tracing::instrument;

/// Why an engine operation was rejected.
///
/// A rejected operation never changes any game, so callers that only care
/// about the resulting state are free to ignore these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EngineErrorKind {
    /// No game with this id exists.
    #[display("game {_0} not found")]
    UnknownGame(GameId),
    /// Square index outside 0-8.
    #[display("square {_0} is off the board")]
    OutOfBounds(usize),
    /// Target square already holds a mark.
    #[display("{_0} is already occupied")]
    SquareOccupied(Position),
    /// The game already has a winner or a full board.
    #[display("game is already over")]
    GameOver,
    /// The other side is to move.
    #[display("not this side's turn")]
    NotYourTurn,
    /// Already at the start of history.
    #[display("nothing to undo")]
    NothingToUndo,
    /// Fewer than two plies ahead in history.
    #[display("nothing to redo")]
    NothingToRedo,
    /// The opponent found no legal square.
    #[display("no move available")]
    NoMoveAvailable,
    /// A patch would break the board/history/winner agreement.
    #[display("patch would leave the game inconsistent")]
    InconsistentPatch,
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Engine error: {} at {}:{}", kind, file, line)]
pub struct EngineError {
    /// What went wrong.
    pub kind: EngineErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Creates a new engine error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: EngineErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<EngineErrorKind> for EngineError {
    #[track_caller]
    fn from(kind: EngineErrorKind) -> Self {
        Self::new(kind)
    }
}
