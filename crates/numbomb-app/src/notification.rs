//! Notifications published to presentation layers.

use std::sync::Arc;

use numbomb_client::{DisconnectReason, TransportError};
use numbomb_core::TurnState;
use numbomb_proto::{OutboundCommand, ProtocolEvent};
use tokio::sync::mpsc;

/// Receiving end of the engine's notification stream.
///
/// Unbounded so a slow consumer never stalls the engine.
pub type Notifications = mpsc::UnboundedReceiver<Notification>;

/// Something a presentation layer may want to render.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Connect attempt started.
    Connecting,

    /// Connection established and `JOIN` sent.
    Connected,

    /// Connect attempt failed. The session is disconnected again.
    ConnectFailed {
        /// Transport failure.
        error: Arc<TransportError>,
    },

    /// Connection ended. Published once per connection.
    ConnectionLost {
        /// Cause of the disconnect.
        reason: DisconnectReason,
    },

    /// One inbound line, as received.
    ServerText {
        /// Line text without its terminator.
        raw: String,
    },

    /// The turn state machine applied an event.
    Transition {
        /// Decoded event.
        event: ProtocolEvent,
        /// State before the event.
        from: TurnState,
        /// State after the event.
        to: TurnState,
    },

    /// A command was handed to the connection for transmission.
    CommandSent {
        /// The command.
        command: OutboundCommand,
    },
}
