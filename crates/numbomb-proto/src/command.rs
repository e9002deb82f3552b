//! Client commands.

use std::fmt;

/// A command sent from the client to the server.
///
/// Commands are created in response to player intents, validated locally by
/// the session, then handed to the connection for transmission. They are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// Announce the player. Sent once, right after the transport opens.
    Join {
        /// Player name. Not escaped; a `:` in the name corrupts framing.
        name: String,
    },

    /// Ask the server to start the round.
    StartGame,

    /// Submit a guess.
    Guess {
        /// Player name, repeated on every guess.
        name: String,
        /// Guessed number.
        value: i64,
    },

    /// Ask the server for a status summary.
    Status,
}

impl OutboundCommand {
    /// Create a `Join` command.
    pub fn join(name: impl Into<String>) -> Self {
        Self::Join { name: name.into() }
    }

    /// Create a `Guess` command.
    pub fn guess(name: impl Into<String>, value: i64) -> Self {
        Self::Guess { name: name.into(), value }
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join { name } => write!(f, "JOIN:{name}"),
            Self::StartGame => f.write_str("START:"),
            Self::Guess { name, value } => write!(f, "GUESS:{name}:{value}"),
            Self::Status => f.write_str("STATUS:"),
        }
    }
}
