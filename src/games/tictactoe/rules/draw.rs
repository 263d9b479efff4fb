//! Stalemate detection.

use super::super::Grid;
use tracing::instrument;

/// Checks if the grid is full (all cells occupied).
///
/// A full grid with no winning line is a stalemate.
#[instrument(skip(grid))]
pub fn is_full(grid: &Grid) -> bool {
    grid.is_full()
}
