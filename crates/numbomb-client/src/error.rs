//! Transport errors.

use std::{io, time::Duration};

use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect failed (resolution, refusal, unreachable host).
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// TCP connect did not finish in time.
    #[error("connecting to {addr} timed out after {after:?}")]
    Timeout {
        /// Address that was dialed.
        addr: String,
        /// Configured deadline.
        after: Duration,
    },

    /// I/O failure on an open stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writer task is gone; the connection is closed or closing.
    #[error("connection closed")]
    Closed,
}
