//! Turn state machine.
//!
//! Tracks whose turn it is and the current guess range, using only what the
//! server says. The client never narrows the range itself.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  TurnGranted   ┌──────────────┐
//! │ AwaitingStart │───────────────>│    MyTurn    │
//! └───────────────┘                └──────────────┘
//!         │                          │        ↑
//!         │ TurnTransferred          │        │ TurnGranted
//!         │                          ↓        │
//!         │                        ┌──────────────┐
//!         └───────────────────────>│ OpponentTurn │
//!                                  └──────────────┘
//!
//!   any non-terminal phase ── Exploded ──> ┌──────────┐
//!                                          │ Exploded │ (terminal)
//!                                          └──────────┘
//! ```
//!
//! `RangeUpdated` overwrites the range in any non-terminal phase without
//! changing the phase.

use numbomb_proto::ProtocolEvent;

use crate::{ConnectionState, GuessRange, Phase, TurnState, ValidationError};

/// State before and after an applied event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the event.
    pub from: TurnState,
    /// State after the event.
    pub to: TurnState,
}

impl Transition {
    /// Whether the phase changed.
    pub fn phase_changed(&self) -> bool {
        self.from.phase != self.to.phase
    }
}

/// Why an event left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Already exploded; nothing moves out of the terminal phase.
    Terminal,
    /// Range update with `min > max`.
    InvertedRange {
        /// Received lower bound.
        min: i64,
        /// Received upper bound.
        max: i64,
    },
    /// Turn transfer that did not go to another player.
    NotToOther,
    /// Opaque text.
    Unrecognized,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Event was accepted. The transition may leave the state equal.
    Applied(Transition),
    /// Event had no effect.
    Ignored(IgnoreReason),
}

impl Outcome {
    /// The transition, if the event was applied.
    pub fn transition(&self) -> Option<Transition> {
        match self {
            Self::Applied(transition) => Some(*transition),
            Self::Ignored(_) => None,
        }
    }
}

/// Turn state machine.
///
/// Pure state machine: no I/O, no clock. One instance lives for exactly one
/// connection and is rebuilt on reconnect.
#[derive(Debug, Clone, Default)]
pub struct TurnMachine {
    state: TurnState,
}

impl TurnMachine {
    /// Create a machine in [`Phase::AwaitingStart`] with the default range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Current guess range.
    pub fn range(&self) -> GuessRange {
        self.state.range
    }

    /// Snapshot of phase and range.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Apply a decoded server event.
    pub fn apply(&mut self, event: &ProtocolEvent) -> Outcome {
        if self.state.phase.is_terminal() {
            return Outcome::Ignored(IgnoreReason::Terminal);
        }

        let from = self.state;
        match event {
            ProtocolEvent::TurnGranted => self.state.phase = Phase::MyTurn,
            ProtocolEvent::TurnTransferred { to_other: true } => {
                self.state.phase = Phase::OpponentTurn;
            },
            ProtocolEvent::TurnTransferred { to_other: false } => {
                return Outcome::Ignored(IgnoreReason::NotToOther);
            },
            ProtocolEvent::RangeUpdated { min, max } => {
                let Some(range) = GuessRange::new(*min, *max) else {
                    tracing::warn!(min, max, "ignoring inverted range from server");
                    return Outcome::Ignored(IgnoreReason::InvertedRange { min: *min, max: *max });
                };
                self.state.range = range;
            },
            ProtocolEvent::Exploded => self.state.phase = Phase::Exploded,
            ProtocolEvent::Unrecognized { .. } => {
                return Outcome::Ignored(IgnoreReason::Unrecognized);
            },
        }

        Outcome::Applied(Transition { from, to: self.state })
    }

    /// Check whether a guess may be sent.
    ///
    /// Accepted iff connected, on the local player's turn, and inside the
    /// current range.
    pub fn validate_guess(
        &self,
        value: i64,
        connection: ConnectionState,
    ) -> Result<(), ValidationError> {
        if !connection.is_connected() {
            return Err(ValidationError::NotConnected);
        }
        if self.state.phase != Phase::MyTurn {
            return Err(ValidationError::NotMyTurn { phase: self.state.phase });
        }
        if !self.state.range.contains(value) {
            return Err(ValidationError::OutOfRange { value, range: self.state.range });
        }
        Ok(())
    }
}

/// Check whether a start request may be sent.
///
/// Only connectivity matters; any connected player may ask to (re)start.
pub fn validate_start(connection: ConnectionState) -> Result<(), ValidationError> {
    if connection.is_connected() { Ok(()) } else { Err(ValidationError::NotConnected) }
}

/// Parse guess text typed by the player.
pub fn parse_guess(text: &str) -> Result<i64, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyGuess);
    }
    text.parse().map_err(|_| ValidationError::NotANumber { input: text.to_string() })
}
