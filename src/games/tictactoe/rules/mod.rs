//! Outcome evaluation for the grid game.

mod draw;
mod win;

pub use draw::is_full;
pub use win::check_winner;

use super::phases::Outcome;
use super::types::Grid;
use tracing::{debug, instrument};

/// Evaluates the grid after a placement.
///
/// Lines are checked before fullness, so a final move that both completes a
/// line and fills the grid is a win.
#[instrument(skip(grid), fields(rows = grid.rows(), cols = grid.cols()))]
pub fn evaluate(grid: &Grid) -> Outcome {
    let outcome = if let Some(winner) = check_winner(grid) {
        Outcome::Win(winner)
    } else if is_full(grid) {
        Outcome::Stalemate
    } else {
        Outcome::InProgress
    };
    debug!(%outcome, "Evaluated grid");
    outcome
}
