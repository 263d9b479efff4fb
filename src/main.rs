//! Tic-tac-toe broker - unified CLI
//!
//! Runs either the broker for one game or an interactive player.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use tictactoe_broker::{BrokerConfig, BrokerMessage, Piece, PlayerClient, Position, logging};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = BrokerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            rows,
            cols,
            log_dir,
        } => {
            let config = override_config(config, host, port, rows, cols, log_dir);
            run_broker(config).await
        }
        Command::Play {
            host,
            port,
            subscribe,
        } => {
            let config = override_config(config, host, port, None, None, None);
            run_player(config, subscribe).await
        }
    }
}

fn override_config(
    mut config: BrokerConfig,
    host: Option<String>,
    port: Option<u16>,
    rows: Option<usize>,
    cols: Option<usize>,
    log_dir: Option<PathBuf>,
) -> BrokerConfig {
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(rows) = rows {
        config = config.with_rows(rows);
    }
    if let Some(cols) = cols {
        config = config.with_cols(cols);
    }
    if log_dir.is_some() {
        config = config.with_log_dir(log_dir);
    }
    config
}

/// Run the broker until the game ends
async fn run_broker(config: BrokerConfig) -> Result<()> {
    let log_file = logging::init("info", config.log_dir().as_deref(), config.host())?;
    if let Some(path) = &log_file {
        info!(path = %path.display(), "Logging to file");
    }

    let broker = tictactoe_broker::Broker::bind(&config).await?;
    let outcome = broker.run().await?;
    info!(%outcome, "Server shut down");
    Ok(())
}

/// Join a game and play it from the terminal
#[instrument(skip(config), fields(address = %config.address()))]
async fn run_player(config: BrokerConfig, topic: Piece) -> Result<()> {
    logging::init("warn", config.log_dir().as_deref(), "player")?;

    let mut client = PlayerClient::connect(config.address()).await?;
    let subscription = client.subscribe(topic).await?;
    println!(
        "{}",
        BrokerMessage::Subscribed {
            topic: subscription.topic,
            turn_order: subscription.turn_order,
        }
    );

    println!("Waiting for the adversary to join...");
    let start = client.await_start().await?;
    println!("You play {} against {}.", start.piece, start.opponent);
    show_grid(&client);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut my_turn = start.turn_order == 0;

    while !client.is_finished() {
        if !my_turn {
            println!("Waiting for adversary to play...");
            let message = client.wait().await?;
            println!("{message}");
            show_grid(&client);
            my_turn = matches!(message, BrokerMessage::OpponentMoved { .. });
            continue;
        }

        println!("Place your piece (row,col): ");
        let Some(line) = input.next_line().await? else {
            break;
        };
        let Some(position) = Position::parse(&line) else {
            println!("Enter the position as row,col");
            continue;
        };

        let reply = client.publish(position).await?;
        println!("{reply}");
        match reply {
            BrokerMessage::Placed { .. } => {
                show_grid(&client);
                my_turn = false;
            }
            message if message.is_terminal() => show_grid(&client),
            _ => println!("Try again."),
        }
    }

    Ok(())
}

fn show_grid(client: &PlayerClient) {
    if let Some(grid) = client.grid() {
        println!("{grid}");
    }
}
