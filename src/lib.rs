//! Tic-tac-toe broker library - turn arbitration for remote grid games
//!
//! A broker owns the grid of one game and referees two players connected
//! over TCP.
//!
//! # Architecture
//!
//! - **Games**: grid, placement rules and outcome evaluation
//! - **Session**: registry of the two players and their outboxes
//! - **Arbiter**: turn state machine, transport free
//! - **Broker**: TCP accept/registration phase and the game loop
//! - **Client**: player side of the protocol
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_broker::{Broker, BrokerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BrokerConfig::default().with_port(5000);
//! let broker = Broker::bind(&config).await?;
//! let outcome = broker.run().await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod arbiter;
mod broker;
mod client;
mod config;
mod games;
mod protocol;
mod session;

pub mod logging;

// Crate-level exports - Game types
pub use games::tictactoe::{
    Cell, Grid, InvalidPiece, Move, Outcome, Phase, Piece, PlacementError, Position, check_winner,
    evaluate, is_full,
};

// Crate-level exports - Session registry
pub use session::{RegistrationError, Seat, Session, SessionRegistry};

// Crate-level exports - Turn arbitration
pub use arbiter::{Arbiter, Dispatch, SubmitError, Verdict};

// Crate-level exports - Wire protocol
pub use protocol::{
    BrokerMessage, ProtocolError, RejectReason, decode_message, decode_move, decode_subscription,
    encode_line, encode_subscription,
};

// Crate-level exports - Networking
pub use broker::{Broker, BrokerError, Outbox};
pub use client::{ClientError, GameStart, PlayerClient, Subscription};

// Crate-level exports - Configuration
pub use config::{
    BrokerConfig, ConfigError, ENV_COLS, ENV_HOST, ENV_LOG_DIR, ENV_PORT, ENV_ROWS,
    MAX_CELLS,
};
