//! Number bomb protocol core.
//!
//! Pure, I/O-free logic shared by the client and the session engine: the turn
//! state machine driven by decoded server events, and the local validation
//! that decides whether a command may be sent at all.
//!
//! # Components
//!
//! - [`TurnMachine`]: phase and range tracking from [`numbomb_proto::ProtocolEvent`]s
//! - [`ConnectionState`], [`Phase`], [`GuessRange`], [`TurnState`]: state types
//! - [`ValidationError`]: local rejection of player intents

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
mod game;
mod state;

pub use error::ValidationError;
pub use game::{IgnoreReason, Outcome, Transition, TurnMachine, parse_guess, validate_start};
pub use state::{ConnectionState, DEFAULT_MAX, DEFAULT_MIN, GuessRange, Phase, TurnState};
