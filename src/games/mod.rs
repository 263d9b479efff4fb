//! Game rules served by the broker.

pub mod tictactoe;
