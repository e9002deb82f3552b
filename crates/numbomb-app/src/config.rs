//! Session configuration.

use numbomb_client::TransportConfig;

/// Port the game server listens on by default.
pub const DEFAULT_PORT: u16 = 8889;

/// Server address used when none is given.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8889";

/// Engine configuration.
///
/// The server address is fixed for the lifetime of the engine. The player
/// name is supplied with each join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server address (host:port).
    pub server_addr: String,
    /// Transport settings for every connection the engine opens.
    pub transport: TransportConfig,
}

impl SessionConfig {
    /// Configuration for `server_addr` with default transport settings.
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self { server_addr: server_addr.into(), transport: TransportConfig::default() }
    }

    /// Replace the transport settings.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_ADDR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_address_uses_default_port() {
        let config = SessionConfig::default();
        assert!(config.server_addr.ends_with(&format!(":{DEFAULT_PORT}")));
        assert_eq!(config.transport, TransportConfig::default());
    }
}
