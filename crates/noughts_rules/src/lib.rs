//! Pure tic-tac-toe rules.
//!
//! Board types, win and draw detection, and the fixed-priority heuristic
//! opponent. Nothing in this crate performs I/O or holds state between
//! calls.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod opponent;
mod position;
pub mod rules;
mod types;

pub use opponent::{Tier, completing_move, select_move, select_move_with_tier};
pub use position::Position;
pub use rules::{check_winner, is_draw, is_full};
pub use types::{Board, Mark, Square};
