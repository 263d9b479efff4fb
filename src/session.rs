//! Session registry: the two players of a game and how to reach them.

use crate::games::tictactoe::Piece;
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Turn-order slot, assigned by registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize, strum::EnumIter,
)]
pub enum Seat {
    /// Registered first, moves first.
    First,
    /// Registered second.
    Second,
}

impl Seat {
    /// Turn-order index on the wire (`0` moves first).
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    /// Returns the seat for a turn-order index.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Seat::First),
            1 => Some(Seat::Second),
            _ => None,
        }
    }

    /// Returns the opposing seat.
    pub fn other(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

/// A registered connection representing one player.
///
/// `symbol` is the topic the player subscribed to, which is its opponent's
/// piece. The session never changes after registration.
#[derive(Debug, Clone, Getters)]
pub struct Session<C> {
    /// Subscribed topic.
    symbol: Piece,
    /// Write target for messages to this player.
    channel: C,
    /// Arrival order.
    seat: Seat,
}

/// Why a registration attempt was refused.
///
/// Only the offending connection is affected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RegistrationError {
    /// Another session already subscribed to this symbol.
    #[display("Piece {} already subscribed", _0)]
    DuplicateSymbol(Piece),

    /// Both seats are taken.
    #[display("Registry full")]
    Full,

    /// The registration token is not a single visible character.
    #[display("Invalid piece token {:?}", _0)]
    InvalidSymbol(String),
}

impl std::error::Error for RegistrationError {}

/// Maps subscribed symbols to their sessions, in arrival order.
#[derive(Debug, Clone)]
pub struct SessionRegistry<C> {
    sessions: Vec<Session<C>>,
}

impl<C> SessionRegistry<C> {
    /// Number of sessions a game needs.
    pub const CAPACITY: usize = 2;

    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Registers a session for `symbol` and returns its seat.
    #[instrument(skip(self, channel), fields(registered = self.sessions.len()))]
    pub fn register(&mut self, symbol: Piece, channel: C) -> Result<Seat, RegistrationError> {
        if self.sessions.iter().any(|session| session.symbol == symbol) {
            warn!(%symbol, "Duplicate subscription");
            return Err(RegistrationError::DuplicateSymbol(symbol));
        }

        let seat = Seat::from_index(self.sessions.len()).ok_or_else(|| {
            warn!(%symbol, "Registry already has 2 sessions");
            RegistrationError::Full
        })?;

        self.sessions.push(Session {
            symbol,
            channel,
            seat,
        });
        info!(%symbol, %seat, "Session registered");
        Ok(seat)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Checks whether no session registered yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Checks whether both seats are taken.
    pub fn is_complete(&self) -> bool {
        self.sessions.len() == Self::CAPACITY
    }

    /// Gets the session in a seat.
    pub fn session(&self, seat: Seat) -> Option<&Session<C>> {
        self.sessions.get(seat.index())
    }

    /// Gets the session subscribed to `symbol`.
    pub fn subscriber(&self, symbol: Piece) -> Option<&Session<C>> {
        self.sessions.iter().find(|session| session.symbol == symbol)
    }

    /// Piece played by the session in `seat`: the topic the other session
    /// subscribed to.
    pub fn piece_of(&self, seat: Seat) -> Option<Piece> {
        self.session(seat.other()).map(|session| session.symbol)
    }

    /// Pieces played by each seat, once both sessions are present.
    pub fn pieces(&self) -> Option<[Piece; 2]> {
        Some([self.piece_of(Seat::First)?, self.piece_of(Seat::Second)?])
    }

    /// Iterates sessions in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Session<C>> {
        self.sessions.iter()
    }
}

impl<C> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(symbol: char) -> Piece {
        Piece::new(symbol).expect("valid piece")
    }

    #[test]
    fn test_registration_order_assigns_seats() {
        let mut registry = SessionRegistry::new();
        assert_eq!(registry.register(piece('X'), "alice"), Ok(Seat::First));
        assert!(!registry.is_complete());
        assert_eq!(registry.register(piece('O'), "bob"), Ok(Seat::Second));
        assert!(registry.is_complete());
        assert_eq!(registry.subscriber(piece('O')).map(|s| *s.channel()), Some("bob"));
    }

    #[test]
    fn test_pieces_are_opponent_topics() {
        let mut registry = SessionRegistry::new();
        registry.register(piece('X'), ()).expect("first");
        assert_eq!(registry.pieces(), None);
        registry.register(piece('O'), ()).expect("second");
        assert_eq!(registry.piece_of(Seat::First), Some(piece('O')));
        assert_eq!(registry.pieces(), Some([piece('O'), piece('X')]));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut registry = SessionRegistry::new();
        registry.register(piece('X'), 1).expect("first");
        assert_eq!(
            registry.register(piece('X'), 2),
            Err(RegistrationError::DuplicateSymbol(piece('X')))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_full_registry_rejected() {
        let mut registry = SessionRegistry::new();
        registry.register(piece('X'), 1).expect("first");
        registry.register(piece('O'), 2).expect("second");
        assert_eq!(registry.register(piece('#'), 3), Err(RegistrationError::Full));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_seat_alternation() {
        assert_eq!(Seat::First.other(), Seat::Second);
        assert_eq!(Seat::Second.other().index(), 0);
        assert_eq!(Seat::from_index(2), None);
    }
}
