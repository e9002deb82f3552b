//! Local validation errors.
//!
//! Every variant is raised before anything reaches the codec, so a rejected
//! intent never produces network traffic.

use thiserror::Error;

use crate::{GuessRange, Phase};

/// Why a player intent was rejected locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No live connection to the server.
    #[error("not connected to a server")]
    NotConnected,

    /// A session is already connecting or connected.
    #[error("already connected or connecting")]
    AlreadyConnected,

    /// Guesses are only accepted on the local player's turn.
    #[error("not your turn (phase: {phase:?})")]
    NotMyTurn {
        /// Phase at the time of the request.
        phase: Phase,
    },

    /// Guess lies outside the current range.
    #[error("guess {value} must be within {range}")]
    OutOfRange {
        /// Rejected guess.
        value: i64,
        /// Range in force at the time of the request.
        range: GuessRange,
    },

    /// Guess text was empty.
    #[error("enter a number to guess")]
    EmptyGuess,

    /// Guess text was not an integer.
    #[error("not a valid number: {input:?}")]
    NotANumber {
        /// Offending text after trimming.
        input: String,
    },

    /// Player name was empty.
    #[error("player name must not be empty")]
    EmptyPlayerName,
}
