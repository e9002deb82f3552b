//! Transport configuration.

use std::time::Duration;

/// Time allowed for the TCP connect to complete.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport configuration.
///
/// Established connections have no read or write deadline: a half-open peer
/// blocks the receive loop until the connection is closed locally. Closing
/// waits at most [`crate::transport::CLOSE_FLUSH_TIMEOUT`] for queued
/// commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl TransportConfig {
    /// Short timeouts for local development and tests.
    pub fn development() -> Self {
        Self { connect_timeout: Duration::from_secs(1) }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { connect_timeout: DEFAULT_CONNECT_TIMEOUT }
    }
}
