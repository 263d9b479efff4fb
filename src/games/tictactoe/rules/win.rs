//! Win detection for the grid game.

use super::super::{Cell, Grid, Piece};
use tracing::instrument;

/// Returns the piece filling every cell of the line, if any.
fn uniform(mut cells: impl Iterator<Item = Cell>) -> Option<Piece> {
    let first = cells.next()?.piece()?;
    cells
        .all(|cell| cell == Cell::Piece(first))
        .then_some(first)
}

fn row_winner(grid: &Grid) -> Option<Piece> {
    (0..grid.rows()).find_map(|row| uniform(grid.row(row)?.iter().copied()))
}

fn column_winner(grid: &Grid) -> Option<Piece> {
    (0..grid.cols()).find_map(|col| uniform((0..grid.rows()).filter_map(|row| grid.get(row, col))))
}

fn main_diagonal_winner(grid: &Grid) -> Option<Piece> {
    if !grid.is_square() {
        return None;
    }
    uniform((0..grid.rows()).filter_map(|i| grid.get(i, i)))
}

/// Walks down and left from the top-right corner, one cell per row, until
/// the grid runs out of rows or columns.
fn anti_diagonal_winner(grid: &Grid) -> Option<Piece> {
    let last = grid.cols() - 1;
    let len = grid.rows().min(grid.cols());
    uniform((0..len).filter_map(|i| grid.get(i, last - i)))
}

/// Checks if there is a winner on the grid.
///
/// Lines are scanned in a fixed order: every row, then every column, then
/// the main diagonal, then the anti-diagonal. The first complete line found
/// decides the winner. The main diagonal only counts on square grids; the
/// anti-diagonal counts on any grid.
#[instrument(skip(grid))]
pub fn check_winner(grid: &Grid) -> Option<Piece> {
    if grid.rows() == 0 || grid.cols() == 0 {
        return None;
    }
    row_winner(grid)
        .or_else(|| column_winner(grid))
        .or_else(|| main_diagonal_winner(grid))
        .or_else(|| anti_diagonal_winner(grid))
}
