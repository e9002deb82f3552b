//! Invariant checking over session traces.
//!
//! Invariants are properties that must always hold during a session. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across arbitrary sequences of server lines and
//! player intents.
//!
//! # Architecture
//!
//! A test records one [`Observation`] after every step it drives (initial
//! state first), collecting them into a [`Trace`]. Registered [`Invariant`]s
//! are then run against the whole trace.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&trace, "after random steps");
//! ```

use std::fmt;

use numbomb_core::{ConnectionState, Phase, TurnState};
use numbomb_proto::OutboundCommand;

/// Session state after one step, plus the commands that step sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Connection state after the step.
    pub connection: ConnectionState,
    /// Turn state after the step.
    pub turn: TurnState,
    /// Commands handed to the connection during the step.
    pub sent: Vec<OutboundCommand>,
}

impl Observation {
    /// Observation with nothing sent.
    pub fn new(connection: ConnectionState, turn: TurnState) -> Self {
        Self { connection, turn, sent: Vec::new() }
    }

    /// Attach the commands sent during the step.
    #[must_use]
    pub fn with_sent(mut self, sent: Vec<OutboundCommand>) -> Self {
        self.sent = sent;
        self
    }
}

/// Ordered observations of one engine.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Observations in step order.
    pub observations: Vec<Observation>,
}

impl Trace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation.
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Consecutive `(before, after)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (&Observation, &Observation)> {
        self.observations.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a trace.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the trace.
    fn check(&self, trace: &Trace) -> InvariantResult;
}

/// Once exploded, a session stays exploded until a new connect attempt
/// rebuilds it.
pub struct ExplodedIsTerminal;

impl Invariant for ExplodedIsTerminal {
    fn name(&self) -> &'static str {
        "ExplodedIsTerminal"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        for (index, (before, after)) in trace.steps().enumerate() {
            let rebuilt = after.connection == ConnectionState::Connecting
                && before.connection != ConnectionState::Connecting;
            if before.turn.phase == Phase::Exploded && !rebuilt && after.turn != before.turn {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {}: left Exploded: {:?} -> {:?}",
                        index + 1,
                        before.turn,
                        after.turn
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A guess is sent only while connected, on our turn, and inside the range
/// in force before the step.
pub struct GuessRequiresTurn;

impl Invariant for GuessRequiresTurn {
    fn name(&self) -> &'static str {
        "GuessRequiresTurn"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        for (index, (before, after)) in trace.steps().enumerate() {
            for command in &after.sent {
                let OutboundCommand::Guess { value, .. } = command else { continue };

                let allowed = before.connection == ConnectionState::Connected
                    && before.turn.phase == Phase::MyTurn
                    && before.turn.range.contains(*value);
                if !allowed {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "step {}: guess {value} sent in {:?} with {:?}",
                            index + 1,
                            before.connection,
                            before.turn
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Start and status requests are sent only while connected.
pub struct CommandsRequireConnection;

impl Invariant for CommandsRequireConnection {
    fn name(&self) -> &'static str {
        "CommandsRequireConnection"
    }

    fn check(&self, trace: &Trace) -> InvariantResult {
        for (index, (before, after)) in trace.steps().enumerate() {
            let gated = after
                .sent
                .iter()
                .any(|c| matches!(c, OutboundCommand::StartGame | OutboundCommand::Status));
            if gated && before.connection != ConnectionState::Connected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {}: {:?} sent while {:?}",
                        index + 1,
                        after.sent,
                        before.connection
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`ExplodedIsTerminal`]
    /// - [`GuessRequiresTurn`]
    /// - [`CommandsRequireConnection`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ExplodedIsTerminal);
        registry.add(GuessRequiresTurn);
        registry.add(CommandsRequireConnection);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, trace: &Trace) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with context on violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, trace: &Trace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
