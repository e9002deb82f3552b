//! Observable session state.

use numbomb_core::{ConnectionState, TurnState};

/// Immutable copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Name of the last join request. `None` before the first join.
    pub player: Option<String>,
    /// Server address (host:port).
    pub server_addr: String,
    /// Connection state.
    pub connection: ConnectionState,
    /// Phase and range.
    pub turn: TurnState,
}
