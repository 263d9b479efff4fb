//! Game phases and outcomes.

use super::types::Piece;
use serde::{Deserialize, Serialize};

/// Result of evaluating the grid after a move.
///
/// Derived from the grid each time, never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// No line completed and cells remain.
    InProgress,
    /// A full line of this piece.
    Win(Piece),
    /// Grid full with no line.
    Stalemate,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Piece> {
        match self {
            Outcome::Win(piece) => Some(*piece),
            Outcome::InProgress | Outcome::Stalemate => None,
        }
    }

    /// Checks whether the game is over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Win(piece) => write!(f, "Piece {piece} wins"),
            Outcome::Stalemate => write!(f, "Stalemate"),
        }
    }
}

/// Lifecycle of one game on the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for both players to register.
    AwaitingPlayers,
    /// Moves are being accepted.
    InProgress,
    /// Terminal; carries the final outcome.
    Finished(Outcome),
}
