//! Wire protocol between the broker and players.
//!
//! Every message is a single `\n`-terminated line. The registration request
//! is a bare token; everything else is JSON.

use crate::games::tictactoe::{Move, Piece, PlacementError, Position};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Why the broker refused a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Position past the edge of the grid.
    OutOfBoard,
    /// Cell already taken.
    Occupied,
    /// Sender does not hold the turn.
    NotYourTurn,
    /// Move symbol is not the sender's piece.
    WrongPiece,
    /// Request line could not be decoded.
    Malformed,
}

impl RejectReason {
    fn label(self) -> &'static str {
        match self {
            RejectReason::OutOfBoard => "OUT OF BOARD",
            RejectReason::Occupied => "OCCUPIED",
            RejectReason::NotYourTurn => "NOT YOUR TURN",
            RejectReason::WrongPiece => "NOT YOUR PIECE",
            RejectReason::Malformed => "MALFORMED MOVE",
        }
    }
}

impl From<PlacementError> for RejectReason {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::OutOfBounds(_) => RejectReason::OutOfBoard,
            PlacementError::Occupied(_) => RejectReason::Occupied,
        }
    }
}

/// Message from the broker to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrokerMessage {
    /// Registration accepted.
    Subscribed {
        /// Topic the player subscribed to.
        topic: Piece,
        /// `0` moves first.
        turn_order: usize,
    },
    /// Registration refused; the connection is closed afterwards.
    RegistrationRefused {
        /// Human-readable reason.
        reason: String,
    },
    /// Both players present; the game begins.
    GameStarted {
        /// Piece this player places.
        piece: Piece,
        /// Piece of the opponent.
        opponent: Piece,
        /// `0` moves first.
        turn_order: usize,
        /// Grid height.
        rows: usize,
        /// Grid width.
        cols: usize,
    },
    /// Mover's piece was placed.
    Placed {
        /// Where it landed.
        position: Position,
    },
    /// Mover's request was refused; the turn stays with the sender.
    MoveRejected {
        /// Requested position, when the request could be decoded.
        position: Option<Position>,
        /// Why.
        reason: RejectReason,
    },
    /// The opponent placed a piece.
    OpponentMoved {
        /// Where it landed.
        position: Position,
    },
    /// Game over, recipient won.
    Win,
    /// Game over, recipient lost.
    Lose,
    /// Game over, nobody won.
    Stalemate,
}

impl BrokerMessage {
    /// Checks whether this message ends the game for the recipient.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BrokerMessage::Win | BrokerMessage::Lose | BrokerMessage::Stalemate
        )
    }

    /// Rejection message for a placement failure.
    pub fn rejected(err: PlacementError) -> Self {
        BrokerMessage::MoveRejected {
            position: Some(err.position()),
            reason: err.into(),
        }
    }
}

impl std::fmt::Display for BrokerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerMessage::Subscribed { topic, turn_order } => {
                write!(f, "[BOARD]: Subscribed to piece {topic},{turn_order}")
            }
            BrokerMessage::RegistrationRefused { reason } => write!(f, "[BOARD]: {reason}"),
            BrokerMessage::GameStarted {
                piece,
                rows,
                cols,
                turn_order,
                ..
            } => {
                let order = if *turn_order == 0 { "first" } else { "second" };
                write!(f, "[BOARD]: Game on a {rows}x{cols} board, you play {piece} and move {order}")
            }
            BrokerMessage::Placed { position } => write!(f, "[BOARD]: Piece placed at {position}"),
            BrokerMessage::MoveRejected {
                position: Some(position),
                reason,
            } => write!(
                f,
                "[BOARD]: Position [{},{}]: {}",
                position.row,
                position.col,
                reason.label()
            ),
            BrokerMessage::MoveRejected {
                position: None,
                reason,
            } => write!(f, "[BOARD]: {}", reason.label()),
            BrokerMessage::OpponentMoved { position } => {
                write!(f, "[BOARD]: Adversary move: {position}")
            }
            BrokerMessage::Win => write!(f, "[BOARD]: YOU WIN!"),
            BrokerMessage::Lose => write!(f, "[BOARD]: YOU LOSE..."),
            BrokerMessage::Stalemate => write!(f, "[BOARD]: STALEMATE: END OF GAME"),
        }
    }
}

/// Error decoding or encoding a protocol line.
#[derive(Debug, Display)]
pub enum ProtocolError {
    /// JSON did not match the expected message.
    #[display("Malformed message: {}", _0)]
    Json(serde_json::Error),

    /// Registration token is not a single visible character.
    #[display("Invalid piece token {:?}", _0)]
    InvalidToken(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Json(err)
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Json(err) => Some(err),
            ProtocolError::InvalidToken(_) => None,
        }
    }
}

/// Encodes a value as a single JSON line, newline included.
pub fn encode_line<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

/// Decodes a move request line.
#[instrument]
pub fn decode_move(line: &str) -> Result<Move, ProtocolError> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Decodes a broker message line.
#[instrument]
pub fn decode_message(line: &str) -> Result<BrokerMessage, ProtocolError> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Decodes a registration request line.
#[instrument]
pub fn decode_subscription(line: &str) -> Result<Piece, ProtocolError> {
    Piece::parse_token(line).ok_or_else(|| ProtocolError::InvalidToken(line.trim().to_string()))
}

/// Encodes a registration request line.
pub fn encode_subscription(topic: Piece) -> String {
    format!("{topic}\n")
}
