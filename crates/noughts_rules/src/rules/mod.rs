//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating board state. Rules are kept apart from
//! board storage so the state machine and the opponent can share them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};
