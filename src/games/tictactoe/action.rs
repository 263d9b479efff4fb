//! Move requests and placement failures.

use super::position::Position;
use super::types::Piece;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// A move: a piece placed at a position.
///
/// Built from an inbound request, consumed right away by the arbiter.
/// The wire shape is `{ "symbol": "O", "position": [row, col] }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Move {
    /// The piece being placed.
    pub symbol: Piece,
    /// Where it goes.
    pub position: Position,
}

impl Move {
    /// Row of the move.
    pub fn row(&self) -> usize {
        self.position.row
    }

    /// Column of the move.
    pub fn col(&self) -> usize {
        self.position.col
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.position)
    }
}

/// Why a placement was refused. Recoverable: the mover simply tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PlacementError {
    /// Row or column past the edge of the grid.
    #[display("Position [{},{}]: OUT OF BOARD", _0.row, _0.col)]
    OutOfBounds(Position),

    /// Target cell already holds a piece.
    #[display("Position [{},{}]: OCCUPIED", _0.row, _0.col)]
    Occupied(Position),
}

impl PlacementError {
    /// Returns the rejected position.
    pub fn position(&self) -> Position {
        match self {
            PlacementError::OutOfBounds(position) | PlacementError::Occupied(position) => *position,
        }
    }
}

impl std::error::Error for PlacementError {}
