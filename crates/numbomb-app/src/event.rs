//! Session input events.
//!
//! Player intents enter through the `request_*` methods on
//! [`crate::Session`]; everything that comes back from the network enters as
//! a [`SessionEvent`].

use std::sync::Arc;

use numbomb_client::{ConnectionEvent, TransportError};

/// Events processed by the Session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Connect attempt succeeded.
    Connected {
        /// Attempt that produced the connection.
        attempt: u64,
    },

    /// Connect attempt failed.
    ConnectFailed {
        /// Attempt that failed.
        attempt: u64,
        /// Transport failure.
        error: Arc<TransportError>,
    },

    /// Receive sequence item from the open connection.
    Connection(ConnectionEvent),
}
