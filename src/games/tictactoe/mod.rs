mod action;
mod phases;
mod position;
mod rules;
mod types;

pub use action::{Move, PlacementError};
pub use phases::{Outcome, Phase};
pub use position::Position;
pub use rules::{check_winner, evaluate, is_full};
pub use types::{Cell, Grid, InvalidPiece, Piece};
