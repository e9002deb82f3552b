//! Test harness for the number bomb client.
//!
//! # Scripted Peers
//!
//! [`ScriptedPeer`] plays the server side of one connection: it reads the
//! lines the client sends and writes whatever lines a test scripts. It runs
//! over an in-memory pipe ([`ScriptedPeer::pair`]) for deterministic tests or
//! over a loopback socket ([`ScriptedListener`]) when the real TCP connect
//! path is under test.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties over a [`Trace`] of
//! session observations. Use [`InvariantRegistry::standard()`] for the common
//! set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod peer;

pub use invariants::{
    CommandsRequireConnection, ExplodedIsTerminal, GuessRequiresTurn, Invariant,
    InvariantRegistry, InvariantResult, Observation, Trace, Violation,
};
pub use peer::{DEFAULT_WAIT, ScriptedListener, ScriptedPeer};
