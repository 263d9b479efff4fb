//! TCP broker: registers two players, then runs the game to completion.
//!
//! Each connection gets a reader task and a writer task. Readers decode move
//! requests and forward them, tagged with the sender's seat, over a single
//! channel to the broker loop. The loop is the only owner of the arbiter, so
//! moves are applied strictly one at a time. Writers drain a per-session
//! outbox, which is the channel stored in the session registry.

use crate::arbiter::{Arbiter, Dispatch, SubmitError};
use crate::config::{BrokerConfig, ConfigError};
use crate::games::tictactoe::{Move, Outcome};
use crate::protocol::{self, BrokerMessage};
use crate::session::{RegistrationError, Seat, SessionRegistry};
use derive_more::Display;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Write target of a session.
pub type Outbox = mpsc::UnboundedSender<BrokerMessage>;

type LineReader = Lines<BufReader<OwnedReadHalf>>;

/// Error that ends a broker run.
#[derive(Debug, Display)]
pub enum BrokerError {
    /// Socket failure.
    #[display("I/O error: {}", _0)]
    Io(std::io::Error),

    /// Invalid configuration.
    #[display("{}", _0)]
    Config(ConfigError),

    /// A player dropped mid-game.
    #[display("Player in seat {} disconnected", _0)]
    Disconnected(Seat),

    /// The listener stopped before both players registered.
    #[display("Listener closed before both players registered")]
    ListenerClosed,

    /// Arbiter refused a transition.
    #[display("{}", _0)]
    Arbiter(SubmitError),
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrokerError::Io(err) => Some(err),
            BrokerError::Config(err) => Some(err),
            BrokerError::Arbiter(err) => Some(err),
            BrokerError::Disconnected(_) | BrokerError::ListenerClosed => None,
        }
    }
}

impl From<std::io::Error> for BrokerError {
    fn from(err: std::io::Error) -> Self {
        BrokerError::Io(err)
    }
}

impl From<ConfigError> for BrokerError {
    fn from(err: ConfigError) -> Self {
        BrokerError::Config(err)
    }
}

impl From<SubmitError> for BrokerError {
    fn from(err: SubmitError) -> Self {
        BrokerError::Arbiter(err)
    }
}

/// A connection that sent its registration line.
struct Handshake {
    addr: SocketAddr,
    token: String,
    lines: LineReader,
    writer: OwnedWriteHalf,
}

/// Event from a registered connection.
#[derive(Debug)]
enum Inbound {
    Move(Seat, Move),
    Malformed(Seat, String),
    Closed(Seat),
}

/// Broker for a single game.
pub struct Broker {
    listener: TcpListener,
    rows: usize,
    cols: usize,
}

impl Broker {
    /// Validates the configuration and binds the listening socket.
    #[instrument(skip(config), fields(address = %config.address()))]
    pub async fn bind(config: &BrokerConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        let listener = TcpListener::bind((config.host().as_str(), *config.port())).await?;
        info!(addr = %listener.local_addr()?, "The server is running");
        Ok(Self {
            listener,
            rows: *config.rows(),
            cols: *config.cols(),
        })
    }

    /// Address the broker listens on.
    pub fn local_addr(&self) -> Result<SocketAddr, BrokerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Registers two players, then serves moves until the game ends.
    ///
    /// Connections that register once both seats are taken are refused
    /// with `Registry full`. Returns the final outcome once both players
    /// were notified.
    #[instrument(skip(self), fields(rows = self.rows, cols = self.cols))]
    pub async fn run(self) -> Result<Outcome, BrokerError> {
        let (handshake_tx, mut handshake_rx) = mpsc::channel(4);
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        // Acceptor and readers. Dropping the set on any exit aborts them.
        let mut background = JoinSet::new();
        let mut writers = JoinSet::new();
        let mut registry = SessionRegistry::new();
        let mut arbiter = Arbiter::new(self.rows, self.cols);

        background.spawn(accept_connections(self.listener, handshake_tx));

        let pieces = loop {
            let Some(handshake) = handshake_rx.recv().await else {
                return Err(BrokerError::ListenerClosed);
            };
            admit(handshake, &mut registry, &mut background, &mut writers, &inbound_tx).await;
            if let Some(pieces) = registry.pieces() {
                break pieces;
            }
        };
        drop(inbound_tx);

        deliver(&registry, arbiter.start(pieces)?);

        let outcome = loop {
            let inbound = tokio::select! {
                Some(handshake) = handshake_rx.recv() => {
                    tokio::spawn(refuse(handshake, RegistrationError::Full));
                    continue;
                }
                inbound = inbound_rx.recv() => inbound,
            };
            let Some(inbound) = inbound else {
                return Err(BrokerError::ListenerClosed);
            };
            let verdict = match inbound {
                Inbound::Move(seat, mv) => arbiter.submit(seat, mv)?,
                Inbound::Malformed(seat, line) => {
                    warn!(%seat, %line, "Malformed move request");
                    arbiter.reject_malformed(seat)?
                }
                Inbound::Closed(seat) => {
                    warn!(%seat, "Player disconnected mid-game");
                    return Err(BrokerError::Disconnected(seat));
                }
            };

            let finished = verdict.outcome.filter(Outcome::is_terminal);
            deliver(&registry, verdict.dispatches);
            if let Some(outcome) = finished {
                break outcome;
            }
        };

        info!(%outcome, "END OF THE GAME");
        debug!(grid = %arbiter.grid(), "Final grid");

        // Dropping the outboxes lets each writer flush and close.
        drop(registry);
        background.abort_all();
        while writers.join_next().await.is_some() {}

        Ok(outcome)
    }
}

/// Accepts connections and hands them over once their first line arrives.
/// Runs until aborted.
async fn accept_connections(listener: TcpListener, handshakes: mpsc::Sender<Handshake>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!(%addr, "Connected");
                tokio::spawn(read_handshake(stream, addr, handshakes.clone()));
            }
            Err(err) => warn!(error = %err, "Accept failed"),
        }
    }
}

async fn read_handshake(stream: TcpStream, addr: SocketAddr, handshakes: mpsc::Sender<Handshake>) {
    let (read, writer) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    match lines.next_line().await {
        Ok(Some(token)) => {
            info!(%addr, topic = %token.trim(), "Subscribe request");
            let handshake = Handshake {
                addr,
                token,
                lines,
                writer,
            };
            if handshakes.send(handshake).await.is_err() {
                debug!(%addr, "Registration closed, dropping connection");
            }
        }
        Ok(None) => debug!(%addr, "Closed before subscribing"),
        Err(err) => warn!(%addr, error = %err, "Failed to read subscription"),
    }
}

/// Registers a handshake, or refuses it and closes the connection.
async fn admit(
    handshake: Handshake,
    registry: &mut SessionRegistry<Outbox>,
    readers: &mut JoinSet<()>,
    writers: &mut JoinSet<()>,
    inbound: &mpsc::UnboundedSender<Inbound>,
) {
    let (outbox, outbox_rx) = mpsc::unbounded_channel();
    let registered = protocol::decode_subscription(&handshake.token)
        .map_err(|_| RegistrationError::InvalidSymbol(handshake.token.trim().to_string()))
        .and_then(|topic| registry.register(topic, outbox.clone()).map(|seat| (topic, seat)));

    let (topic, seat) = match registered {
        Ok(registered) => registered,
        Err(err) => return refuse(handshake, err).await,
    };

    let Handshake {
        addr, lines, writer, ..
    } = handshake;
    info!(%addr, %topic, %seat, "Subscribed");
    writers.spawn(write_messages(writer, outbox_rx));
    readers.spawn(read_moves(seat, lines, inbound.clone()));
    let subscribed = BrokerMessage::Subscribed {
        topic,
        turn_order: seat.index(),
    };
    if outbox.send(subscribed).is_err() {
        warn!(%seat, "Writer gone before subscription reply");
    }
}

/// Sends the refusal line, then closes the connection.
async fn refuse(handshake: Handshake, err: RegistrationError) {
    let Handshake {
        addr, mut writer, ..
    } = handshake;
    warn!(%addr, error = %err, "Registration refused");
    let refusal = BrokerMessage::RegistrationRefused {
        reason: err.to_string(),
    };
    match protocol::encode_line(&refusal) {
        Ok(line) => {
            if let Err(err) = writer.write_all(line.as_bytes()).await {
                debug!(%addr, error = %err, "Could not send refusal");
            }
        }
        Err(err) => warn!(%addr, error = %err, "Failed to encode refusal"),
    }
    if let Err(err) = writer.shutdown().await {
        debug!(%addr, error = %err, "Shutdown failed");
    }
}

/// Decodes move requests from one player until the connection closes.
async fn read_moves(seat: Seat, mut lines: LineReader, inbound: mpsc::UnboundedSender<Inbound>) {
    loop {
        let event = match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match protocol::decode_move(&line) {
                Ok(mv) => Inbound::Move(seat, mv),
                Err(err) => {
                    debug!(%seat, error = %err, "Undecodable request");
                    Inbound::Malformed(seat, line)
                }
            },
            Ok(None) => Inbound::Closed(seat),
            Err(err) => {
                warn!(%seat, error = %err, "Read failed");
                Inbound::Closed(seat)
            }
        };

        let closed = matches!(event, Inbound::Closed(_));
        if inbound.send(event).is_err() || closed {
            break;
        }
    }
}

/// Sends queued messages to one player, one JSON line each.
async fn write_messages(mut writer: OwnedWriteHalf, mut outbox: mpsc::UnboundedReceiver<BrokerMessage>) {
    while let Some(message) = outbox.recv().await {
        let line = match protocol::encode_line(&message) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Failed to encode message");
                continue;
            }
        };
        if let Err(err) = writer.write_all(line.as_bytes()).await {
            warn!(error = %err, "Write failed");
            break;
        }
    }
    if let Err(err) = writer.shutdown().await {
        debug!(error = %err, "Shutdown failed");
    }
}

/// Routes dispatches to session outboxes.
fn deliver(registry: &SessionRegistry<Outbox>, dispatches: Vec<Dispatch>) {
    for Dispatch { to, message } in dispatches {
        let Some(session) = registry.session(to) else {
            warn!(seat = %to, "No session for seat");
            continue;
        };
        debug!(seat = %to, topic = %session.symbol(), %message, "Dispatch");
        if session.channel().send(message).is_err() {
            warn!(seat = %to, "Outbox closed");
        }
    }
}
