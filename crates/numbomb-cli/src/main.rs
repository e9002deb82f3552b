//! Number bomb terminal client.
//!
//! Reads commands from stdin and prints server text and state changes to
//! stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! numbomb --name Bob
//! numbomb --server 192.168.1.20:8889 --name Alice --log-level debug
//! ```
//!
//! Commands: `start`, `status`, `quit`, or a number to guess.

use clap::Parser;
use numbomb_app::{DEFAULT_SERVER_ADDR, Notification, Runtime, SessionConfig, SessionError};
use numbomb_core::Phase;
use numbomb_proto::OutboundCommand;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Number bomb client
#[derive(Parser, Debug)]
#[command(name = "numbomb")]
#[command(about = "Terminal client for the number bomb guessing game")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = DEFAULT_SERVER_ADDR)]
    server: String,

    /// Player name
    #[arg(short, long)]
    name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// One line typed by the player.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Start,
    Status,
    Quit,
    Guess(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "start" => Input::Start,
        "status" => Input::Status,
        "quit" | "exit" => Input::Quit,
        text => Input::Guess(text),
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::AwaitingStart => "waiting for start",
        Phase::MyTurn => "your turn",
        Phase::OpponentTurn => "opponent's turn",
        Phase::Exploded => "game over",
    }
}

/// Text shown for a notification.
fn render(notification: &Notification) -> String {
    match notification {
        Notification::Connecting => "* connecting".to_string(),
        Notification::Connected => "* connected".to_string(),
        Notification::ConnectFailed { error } => format!("* connect failed: {error}"),
        Notification::ConnectionLost { reason } => format!("* disconnected: {reason}"),
        Notification::ServerText { raw } => raw.clone(),
        Notification::Transition { from, to, .. } if from.phase != to.phase => {
            format!("* {} (range {})", phase_label(to.phase), to.range)
        },
        Notification::Transition { to, .. } => format!("* range {}", to.range),
        Notification::CommandSent { command } => match command {
            OutboundCommand::Join { name } => format!("* joined as {name}"),
            OutboundCommand::StartGame => "* start requested".to_string(),
            OutboundCommand::Guess { value, .. } => format!("* you guessed {value}"),
            OutboundCommand::Status => "* status requested".to_string(),
        },
    }
}

/// Whether the session is over after this notification.
fn ends_session(notification: &Notification) -> bool {
    matches!(notification, Notification::ConnectFailed { .. } | Notification::ConnectionLost { .. })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!(server = %args.server, player = %args.name, "number bomb client starting");

    let (handle, mut notifications) = Runtime::spawn(SessionConfig::new(args.server));
    handle.request_join(args.name).await?;

    let mut stdout = tokio::io::stdout();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else { break };
                stdout.write_all(format!("{}\n", render(&notification)).as_bytes()).await?;
                stdout.flush().await?;
                if ends_session(&notification) {
                    break;
                }
            },

            line = input.next_line() => {
                let Some(line) = line? else { break };
                let result = match parse_input(&line) {
                    Input::Empty => continue,
                    Input::Quit => break,
                    Input::Start => handle.request_start().await,
                    Input::Status => handle.request_status().await,
                    Input::Guess(text) => handle.request_guess_text(text).await,
                };

                match result {
                    Ok(()) => {},
                    Err(SessionError::EngineStopped) => break,
                    Err(e) => {
                        stdout.write_all(format!("! {e}\n").as_bytes()).await?;
                        stdout.flush().await?;
                    },
                }
            },
        }
    }

    handle.shutdown().await;
    tracing::info!("number bomb client stopped");
    Ok(())
}
