//! Player-side client of the broker protocol.

use crate::games::tictactoe::{Grid, Move, Piece, Position};
use crate::protocol::{self, BrokerMessage, ProtocolError};
use derive_more::Display;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, instrument, warn};

/// Error talking to the broker.
#[derive(Debug, Display)]
pub enum ClientError {
    /// Socket failure.
    #[display("I/O error: {}", _0)]
    Io(std::io::Error),

    /// Undecodable line from the broker.
    #[display("{}", _0)]
    Protocol(ProtocolError),

    /// Broker refused the subscription.
    #[display("Subscription refused: {}", _0)]
    Refused(String),

    /// Message that makes no sense at this point of the exchange.
    #[display("Unexpected message: {}", _0)]
    Unexpected(BrokerMessage),

    /// Operation that needs a started game.
    #[display("Game has not started")]
    NotStarted,

    /// Broker closed the connection.
    #[display("Connection closed by broker")]
    Closed,
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Io(err) => Some(err),
            ClientError::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::Protocol(err)
    }
}

/// Accepted subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Topic subscribed to: the opponent's piece.
    pub topic: Piece,
    /// `0` moves first.
    pub turn_order: usize,
}

impl Subscription {
    /// Checks if this player makes the first move.
    pub fn is_first(&self) -> bool {
        self.turn_order == 0
    }
}

/// Game parameters announced by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStart {
    /// Own piece.
    pub piece: Piece,
    /// Opponent's piece.
    pub opponent: Piece,
    /// `0` moves first.
    pub turn_order: usize,
    /// Grid height.
    pub rows: usize,
    /// Grid width.
    pub cols: usize,
}

/// Connection of one player to the broker.
///
/// Keeps a local replica of the grid, updated from the broker's
/// acknowledgments and opponent notifications.
pub struct PlayerClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    start: Option<GameStart>,
    grid: Option<Grid>,
    finished: bool,
}

impl PlayerClient {
    /// Connects to the broker.
    #[instrument(skip(addr))]
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        debug!(peer = ?stream.peer_addr().ok(), "Connected to broker");
        let (read, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read).lines(),
            writer,
            start: None,
            grid: None,
            finished: false,
        })
    }

    /// Subscribes to the opponent's piece.
    #[instrument(skip(self))]
    pub async fn subscribe(&mut self, topic: Piece) -> Result<Subscription, ClientError> {
        self.send_raw(&protocol::encode_subscription(topic)).await?;
        match self.receive().await? {
            BrokerMessage::Subscribed { topic, turn_order } => Ok(Subscription { topic, turn_order }),
            BrokerMessage::RegistrationRefused { reason } => Err(ClientError::Refused(reason)),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Waits until both players are registered.
    #[instrument(skip(self))]
    pub async fn await_start(&mut self) -> Result<GameStart, ClientError> {
        match self.receive().await? {
            BrokerMessage::GameStarted {
                piece,
                opponent,
                turn_order,
                rows,
                cols,
            } => {
                let start = GameStart {
                    piece,
                    opponent,
                    turn_order,
                    rows,
                    cols,
                };
                self.start = Some(start);
                self.grid = Some(Grid::new(rows, cols));
                Ok(start)
            }
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Places own piece and returns the broker's reply to the mover.
    ///
    /// A `win` or `stalemate` reply means the move was applied and ended the
    /// game, so the local grid records it too.
    #[instrument(skip(self))]
    pub async fn publish(&mut self, position: Position) -> Result<BrokerMessage, ClientError> {
        let piece = self.start.ok_or(ClientError::NotStarted)?.piece;
        self.send_move(Move::new(piece, position)).await?;
        let reply = self.next().await?;
        if matches!(reply, BrokerMessage::Win | BrokerMessage::Stalemate) {
            self.mirror(position, piece);
        }
        Ok(reply)
    }

    /// Sends a move request as is, without waiting for the reply.
    #[instrument(skip(self))]
    pub async fn send_move(&mut self, mv: Move) -> Result<(), ClientError> {
        let line = protocol::encode_line(&mv)?;
        self.send_raw(&line).await
    }

    /// Sends a raw line to the broker.
    pub async fn send_raw(&mut self, line: &str) -> Result<(), ClientError> {
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Reads the next notification and applies it to the local grid.
    #[instrument(skip(self))]
    pub async fn next(&mut self) -> Result<BrokerMessage, ClientError> {
        let message = self.receive().await?;
        self.apply(&message);
        Ok(message)
    }

    /// Waits for the opponent's move or the end of the game.
    pub async fn wait(&mut self) -> Result<BrokerMessage, ClientError> {
        self.next().await
    }

    async fn receive(&mut self) -> Result<BrokerMessage, ClientError> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(protocol::decode_message(&line)?),
                None => return Err(ClientError::Closed),
            }
        }
    }

    fn apply(&mut self, message: &BrokerMessage) {
        if message.is_terminal() {
            self.finished = true;
        }
        let Some(start) = self.start else {
            return;
        };
        let placed = match message {
            BrokerMessage::Placed { position } => Some((*position, start.piece)),
            BrokerMessage::OpponentMoved { position } => Some((*position, start.opponent)),
            _ => None,
        };
        if let Some((position, piece)) = placed {
            self.mirror(position, piece);
        }
    }

    fn mirror(&mut self, position: Position, piece: Piece) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if let Err(err) = grid.place(position.row, position.col, piece) {
            warn!(error = %err, "Local grid out of sync");
        }
    }

    /// Local replica of the grid, once the game started.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Game parameters, once the game started.
    pub fn start(&self) -> Option<&GameStart> {
        self.start.as_ref()
    }

    /// Checks whether a terminal notification was received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
