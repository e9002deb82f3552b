//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, which represents
//! instructions produced by the [`crate::Session`] state machine for the
//! runtime to execute.

use numbomb_proto::OutboundCommand;

use crate::Notification;

/// Actions produced by the Session state machine.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Open a connection and send `JOIN`.
    Connect {
        /// Attempt number; results of older attempts are discarded.
        attempt: u64,
        /// Server address (host:port).
        server_addr: String,
        /// Name announced in `JOIN`.
        player: String,
    },

    /// Hand a command to the open connection.
    Send(OutboundCommand),

    /// Publish to presentation layers.
    Notify(Notification),

    /// Close the open connection, if any.
    CloseConnection,
}
