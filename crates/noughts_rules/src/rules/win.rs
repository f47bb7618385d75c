//! Win detection logic for tic-tac-toe.

use crate::{Board, Mark, Position};
use tracing::instrument;

/// The eight winning lines, in the order they are checked.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
    ],
    [
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ],
    // Columns
    [
        Position::TopLeft,
        Position::MiddleLeft,
        Position::BottomLeft,
    ],
    [
        Position::TopCenter,
        Position::Center,
        Position::BottomCenter,
    ],
    [
        Position::TopRight,
        Position::MiddleRight,
        Position::BottomRight,
    ],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Checks if there is a winner on the board.
///
/// Returns the mark of the first line (in [`LINES`] order) holding three
/// identical marks, `None` otherwise.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|&[a, b, c]| {
        let mark = board.get(a).mark()?;
        (board.get(b).mark() == Some(mark) && board.get(c).mark() == Some(mark)).then_some(mark)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_winner_empty_board() {
        let board = Board::new();
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board = Board::new()
            .with_mark(Position::TopLeft, Mark::X)
            .with_mark(Position::TopCenter, Mark::X)
            .with_mark(Position::TopRight, Mark::X);
        assert_eq!(check_winner(&board), Some(Mark::X));
    }

    #[test]
    fn test_winner_column() {
        let board = Board::new()
            .with_mark(Position::TopRight, Mark::O)
            .with_mark(Position::MiddleRight, Mark::O)
            .with_mark(Position::BottomRight, Mark::O);
        assert_eq!(check_winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = Board::new()
            .with_mark(Position::TopRight, Mark::O)
            .with_mark(Position::Center, Mark::O)
            .with_mark(Position::BottomLeft, Mark::O);
        assert_eq!(check_winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board = Board::new()
            .with_mark(Position::TopLeft, Mark::X)
            .with_mark(Position::TopCenter, Mark::O)
            .with_mark(Position::TopRight, Mark::X);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_no_winner_incomplete() {
        let board = Board::new()
            .with_mark(Position::TopLeft, Mark::X)
            .with_mark(Position::TopCenter, Mark::X);
        assert_eq!(check_winner(&board), None);
    }
}
