//! Grid coordinates.

use serde::{Deserialize, Serialize};

/// A `(row, col)` coordinate on the grid.
///
/// Serialized as a two-element array `[row, col]`. Coordinates are unsigned,
/// so negative positions cannot be expressed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Position {
    /// Row index, from the top.
    pub row: usize,
    /// Column index, from the left.
    pub col: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parses a human `row,col` entry such as `1,2` or `1, 2`.
    pub fn parse(input: &str) -> Option<Self> {
        let (row, col) = input.trim().split_once(',')?;
        Some(Self::new(row.trim().parse().ok()?, col.trim().parse().ok()?))
    }
}

impl From<[usize; 2]> for Position {
    fn from([row, col]: [usize; 2]) -> Self {
        Self::new(row, col)
    }
}

impl From<Position> for [usize; 2] {
    fn from(position: Position) -> Self {
        [position.row, position.col]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}
