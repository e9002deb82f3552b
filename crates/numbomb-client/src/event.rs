//! Events produced by the receive loop.

use std::fmt;

use numbomb_proto::ProtocolEvent;

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server closed the stream.
    PeerClosed,
    /// Reading from the stream failed.
    ReadFailed(String),
    /// Writing to the stream failed.
    WriteFailed(String),
    /// Closed by this side.
    LocalClose,
}

impl DisconnectReason {
    /// Whether the connection ended because of a transport error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::ReadFailed(_) | Self::WriteFailed(_))
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("server closed the connection"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::WriteFailed(e) => write!(f, "write failed: {e}"),
            Self::LocalClose => f.write_str("closed locally"),
        }
    }
}

/// Item of the receive sequence.
///
/// A connection yields any number of `Line`s in read order, followed by
/// exactly one `Disconnected`, after which the sequence ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// One server line and its decoding.
    Line {
        /// Line text without its terminator.
        raw: String,
        /// Decoded event.
        event: ProtocolEvent,
    },

    /// Connection ended.
    Disconnected {
        /// Cause of the disconnect.
        reason: DisconnectReason,
    },
}
