//! Command-line interface for tictactoe_broker.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tictactoe_broker::Piece;

/// Tic-tac-toe broker - referee for two remote players
#[derive(Parser, Debug)]
#[command(name = "tictactoe_broker")]
#[command(about = "Turn-arbitrating broker for two-player grid games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the broker for one game
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Board rows
        #[arg(long)]
        rows: Option<usize>,

        /// Board columns
        #[arg(long)]
        cols: Option<usize>,

        /// Directory for the log file
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Join a game as a player
    Play {
        /// Broker host
        #[arg(long)]
        host: Option<String>,

        /// Broker port
        #[arg(short, long)]
        port: Option<u16>,

        /// Piece to subscribe to (the opponent's piece)
        #[arg(short, long, value_parser = parse_piece)]
        subscribe: Piece,
    },
}

fn parse_piece(token: &str) -> Result<Piece, String> {
    Piece::parse_token(token).ok_or_else(|| format!("{:?} is not a single visible character", token))
}
