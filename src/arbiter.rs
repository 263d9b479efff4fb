//! Turn arbitration for one game.
//!
//! The arbiter owns the grid and the turn, validates moves, evaluates the
//! outcome and decides who hears what. It does no I/O: every decision comes
//! back as a list of [`Dispatch`]es that the broker delivers.

use crate::games::tictactoe::{Grid, Move, Outcome, Phase, Piece, evaluate};
use crate::protocol::{BrokerMessage, RejectReason};
use crate::session::Seat;
use derive_more::Display;
use derive_new::new;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

/// A message addressed to one seat.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Dispatch {
    /// Recipient.
    pub to: Seat,
    /// Payload.
    pub message: BrokerMessage,
}

/// What happened to a submitted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Messages to deliver, in order.
    pub dispatches: Vec<Dispatch>,
    /// Outcome after the move, `None` when the move was rejected.
    pub outcome: Option<Outcome>,
}

impl Verdict {
    fn rejected(to: Seat, message: BrokerMessage) -> Self {
        Self {
            dispatches: vec![Dispatch::new(to, message)],
            outcome: None,
        }
    }

    /// Checks whether the move ended the game.
    pub fn is_final(&self) -> bool {
        self.outcome.is_some_and(|outcome| outcome.is_terminal())
    }
}

/// Submission outside of the in-progress phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubmitError {
    /// Players are not seated yet.
    #[display("Game has not started")]
    NotStarted,

    /// Players were already seated.
    #[display("Game already started")]
    AlreadyStarted,

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for SubmitError {}

/// Turn arbiter state machine: `AwaitingPlayers → InProgress → Finished`.
#[derive(Debug, Clone)]
pub struct Arbiter {
    grid: Grid,
    phase: Phase,
    pieces: Option<[Piece; 2]>,
    to_move: Seat,
    history: Vec<Move>,
}

impl Arbiter {
    /// Creates an arbiter with an empty grid, waiting for players.
    #[instrument]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            grid: Grid::new(rows, cols),
            phase: Phase::AwaitingPlayers,
            pieces: None,
            to_move: Seat::First,
            history: Vec::new(),
        }
    }

    /// Seats both players and starts the game.
    ///
    /// `pieces[i]` is the piece played by the seat with turn order `i`.
    /// Returns the start notification for each seat.
    #[instrument(skip(self))]
    pub fn start(&mut self, pieces: [Piece; 2]) -> Result<Vec<Dispatch>, SubmitError> {
        match self.phase {
            Phase::AwaitingPlayers => {}
            Phase::InProgress => return Err(SubmitError::AlreadyStarted),
            Phase::Finished(_) => return Err(SubmitError::GameOver),
        }

        self.pieces = Some(pieces);
        self.phase = Phase::InProgress;
        info!(first = %pieces[0], second = %pieces[1], "Game started");

        Ok(Seat::iter()
            .map(|seat| {
                Dispatch::new(
                    seat,
                    BrokerMessage::GameStarted {
                        piece: pieces[seat.index()],
                        opponent: pieces[seat.other().index()],
                        turn_order: seat.index(),
                        rows: self.grid.rows(),
                        cols: self.grid.cols(),
                    },
                )
            })
            .collect())
    }

    /// Handles a move sent by `from`.
    ///
    /// Rejections go back to the sender only and leave the grid and the turn
    /// untouched. An accepted move is applied, the grid is evaluated, both
    /// seats are notified and the turn passes to the other seat.
    #[instrument(skip(self), fields(to_move = %self.to_move))]
    pub fn submit(&mut self, from: Seat, mv: Move) -> Result<Verdict, SubmitError> {
        let pieces = match (self.phase, self.pieces) {
            (Phase::InProgress, Some(pieces)) => pieces,
            (Phase::Finished(_), _) => return Err(SubmitError::GameOver),
            _ => return Err(SubmitError::NotStarted),
        };

        if from != self.to_move {
            warn!(%from, "Move out of turn");
            return Ok(Verdict::rejected(
                from,
                BrokerMessage::MoveRejected {
                    position: Some(mv.position),
                    reason: RejectReason::NotYourTurn,
                },
            ));
        }

        let piece = pieces[from.index()];
        if mv.symbol != piece {
            warn!(%from, expected = %piece, got = %mv.symbol, "Move with wrong piece");
            return Ok(Verdict::rejected(
                from,
                BrokerMessage::MoveRejected {
                    position: Some(mv.position),
                    reason: RejectReason::WrongPiece,
                },
            ));
        }

        if let Err(err) = self.grid.place(mv.row(), mv.col(), mv.symbol) {
            debug!(%from, error = %err, "Placement refused");
            return Ok(Verdict::rejected(from, BrokerMessage::rejected(err)));
        }
        self.history.push(mv);
        debug!(%from, %mv, "Piece placed");

        let outcome = evaluate(&self.grid);
        let other = from.other();
        let dispatches = match outcome {
            Outcome::InProgress => {
                self.to_move = other;
                debug!(next = %pieces[other.index()], "Next turn");
                vec![
                    Dispatch::new(from, BrokerMessage::Placed { position: mv.position }),
                    Dispatch::new(other, BrokerMessage::OpponentMoved { position: mv.position }),
                ]
            }
            Outcome::Win(winner) => {
                self.phase = Phase::Finished(outcome);
                info!(%winner, seat = %from, moves = self.history.len(), "Winner");
                vec![
                    Dispatch::new(from, BrokerMessage::Win),
                    Dispatch::new(other, BrokerMessage::Lose),
                ]
            }
            Outcome::Stalemate => {
                self.phase = Phase::Finished(outcome);
                info!(moves = self.history.len(), "Stalemate");
                vec![
                    Dispatch::new(from, BrokerMessage::Stalemate),
                    Dispatch::new(other, BrokerMessage::Stalemate),
                ]
            }
        };

        Ok(Verdict {
            dispatches,
            outcome: Some(outcome),
        })
    }

    /// Answers a request line that could not be decoded.
    ///
    /// Like any other rejection, it reaches the sender only.
    pub fn reject_malformed(&self, from: Seat) -> Result<Verdict, SubmitError> {
        match self.phase {
            Phase::InProgress => Ok(Verdict::rejected(
                from,
                BrokerMessage::MoveRejected {
                    position: None,
                    reason: RejectReason::Malformed,
                },
            )),
            Phase::AwaitingPlayers => Err(SubmitError::NotStarted),
            Phase::Finished(_) => Err(SubmitError::GameOver),
        }
    }

    /// Returns the grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the seat holding the turn.
    pub fn to_move(&self) -> Seat {
        self.to_move
    }

    /// Returns the applied moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the piece of a seat once the game started.
    pub fn piece_of(&self, seat: Seat) -> Option<Piece> {
        self.pieces.map(|pieces| pieces[seat.index()])
    }
}
