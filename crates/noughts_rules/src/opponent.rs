//! Fixed-priority heuristic opponent.
//!
//! The opponent walks a list of tiers from the highest weight down and plays
//! the first move any tier offers. It holds no state; the only randomness
//! (picking among open corners or sides) comes from the caller's RNG, so a
//! seeded RNG makes selection fully reproducible.

use crate::rules::LINES;
use crate::{Board, Mark, Position, Square};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// A heuristic tier the opponent can pick a move from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Tier {
    /// Complete a line of our own.
    #[display("winning move")]
    Win,
    /// Fill the cell that would complete the other side's line.
    #[display("blocking move")]
    Block,
    /// Take the center.
    #[display("center move")]
    Center,
    /// Take a random open corner.
    #[display("corner move")]
    Corner,
    /// Take a random open side.
    #[display("side move")]
    Side,
}

impl Tier {
    const ALL: [Tier; 5] = [Tier::Win, Tier::Block, Tier::Center, Tier::Corner, Tier::Side];

    /// Priority weight; higher tiers are tried first.
    pub fn weight(self) -> u32 {
        match self {
            Tier::Win => 100,
            Tier::Block => 90,
            Tier::Center => 50,
            Tier::Corner => 30,
            Tier::Side => 10,
        }
    }

    /// All tiers ordered by descending weight.
    pub fn by_priority() -> [Tier; 5] {
        let mut tiers = Self::ALL;
        tiers.sort_by_key(|tier| std::cmp::Reverse(tier.weight()));
        tiers
    }

    fn candidate<R: Rng + ?Sized>(self, board: &Board, mark: Mark, rng: &mut R) -> Option<Position> {
        match self {
            Tier::Win => completing_move(board, mark),
            Tier::Block => completing_move(board, mark.opponent()),
            Tier::Center => board.is_empty(Position::Center).then_some(Position::Center),
            Tier::Corner => random_open(board, &Position::CORNERS, rng),
            Tier::Side => random_open(board, &Position::SIDES, rng),
        }
    }
}

/// Finds the empty cell of the first line where `mark` holds the other two.
#[instrument(skip(board))]
pub fn completing_move(board: &Board, mark: Mark) -> Option<Position> {
    LINES.iter().find_map(|line| {
        let owned = line
            .iter()
            .filter(|&&pos| board.get(pos) == Square::Occupied(mark))
            .count();
        let mut empty = line.iter().copied().filter(|&pos| board.is_empty(pos));
        match (owned, empty.next(), empty.next()) {
            (2, Some(pos), None) => Some(pos),
            _ => None,
        }
    })
}

fn random_open<R: Rng + ?Sized>(
    board: &Board,
    candidates: &[Position],
    rng: &mut R,
) -> Option<Position> {
    let open: Vec<Position> = candidates
        .iter()
        .copied()
        .filter(|&pos| board.is_empty(pos))
        .collect();
    open.choose(rng).copied()
}

/// Picks the opponent's next move together with the tier that produced it.
///
/// Returns `None` only when the board is full.
#[instrument(skip(board, rng))]
pub fn select_move_with_tier<R: Rng + ?Sized>(
    board: &Board,
    mark: Mark,
    rng: &mut R,
) -> Option<(Position, Tier)> {
    let choice = Tier::by_priority()
        .into_iter()
        .find_map(|tier| tier.candidate(board, mark, rng).map(|pos| (pos, tier)));
    match choice {
        Some((pos, tier)) => debug!(%pos, %tier, weight = tier.weight(), "Opponent chose move"),
        None => debug!("No legal move for opponent"),
    }
    choice
}

/// Picks the opponent's next move for `mark`, or `None` on a full board.
pub fn select_move<R: Rng + ?Sized>(board: &Board, mark: Mark, rng: &mut R) -> Option<Position> {
    select_move_with_tier(board, mark, rng).map(|(pos, _)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn board_with(xs: &[usize], os: &[usize]) -> Board {
        let place = |board: Board, idx: &usize, mark| {
            board.with_mark(Position::from_index(*idx).unwrap(), mark)
        };
        let board = xs.iter().fold(Board::new(), |b, i| place(b, i, Mark::X));
        os.iter().fold(board, |b, i| place(b, i, Mark::O))
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            Tier::by_priority(),
            [Tier::Win, Tier::Block, Tier::Center, Tier::Corner, Tier::Side]
        );
    }

    #[test]
    fn test_takes_win() {
        let board = board_with(&[0, 1], &[]);
        assert_eq!(
            select_move_with_tier(&board, Mark::X, &mut rng()),
            Some((Position::TopRight, Tier::Win))
        );
    }

    #[test]
    fn test_blocks_opponent_line() {
        let board = board_with(&[], &[0, 1]);
        assert_eq!(
            select_move_with_tier(&board, Mark::X, &mut rng()),
            Some((Position::TopRight, Tier::Block))
        );
    }

    #[test]
    fn test_win_beats_block() {
        // X threatens 3-4-5, O threatens 0-1-2; X to move wins instead of blocking.
        let board = board_with(&[3, 4], &[0, 1]);
        assert_eq!(select_move(&board, Mark::X, &mut rng()), Some(Position::MiddleRight));
    }

    #[test]
    fn test_first_line_breaks_ties() {
        // O completes both row 3-4-5 and diagonal 2-4-6; the row is checked first.
        let board = board_with(&[0, 1, 8], &[2, 3, 4]);
        assert_eq!(select_move(&board, Mark::O, &mut rng()), Some(Position::MiddleRight));
    }

    #[test]
    fn test_blocked_line_is_not_a_threat() {
        let board = board_with(&[0, 1, 4], &[2]);
        // 0-1-2 is dead; the first live line is column 1-4-7.
        assert_eq!(completing_move(&board, Mark::X), Some(Position::BottomCenter));
    }

    #[test]
    fn test_center_when_nothing_urgent() {
        let board = board_with(&[0], &[]);
        assert_eq!(
            select_move_with_tier(&board, Mark::O, &mut rng()),
            Some((Position::Center, Tier::Center))
        );
    }

    #[test]
    fn test_corner_after_center_taken() {
        let board = board_with(&[4], &[]);
        let (pos, tier) = select_move_with_tier(&board, Mark::O, &mut rng()).unwrap();
        assert_eq!(tier, Tier::Corner);
        assert!(Position::CORNERS.contains(&pos));
    }

    #[test]
    fn test_side_when_corners_and_center_taken() {
        // O X O / . X . / X O X: no live threats, only sides 3 and 5 remain.
        let board = board_with(&[1, 4, 6, 8], &[0, 2, 7]);
        assert_eq!(completing_move(&board, Mark::X), None);
        assert_eq!(completing_move(&board, Mark::O), None);
        let (pos, tier) = select_move_with_tier(&board, Mark::O, &mut rng()).unwrap();
        assert_eq!(tier, Tier::Side);
        assert!([Position::MiddleLeft, Position::MiddleRight].contains(&pos));
    }

    #[test]
    fn test_full_board_has_no_move() {
        let board = board_with(&[0, 2, 4, 5, 7], &[1, 3, 6, 8]);
        assert_eq!(select_move(&board, Mark::O, &mut rng()), None);
    }

    #[test]
    fn test_seeded_choice_is_reproducible() {
        let board = board_with(&[4], &[]);
        let first = select_move(&board, Mark::O, &mut StdRng::seed_from_u64(42));
        let second = select_move(&board, Mark::O, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
