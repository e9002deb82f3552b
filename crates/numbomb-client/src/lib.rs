//! Client
//!
//! Connection manager for the number bomb protocol. Owns the socket, runs the
//! receive loop that decodes server lines, and serializes outbound commands
//! through a single writer task.
//!
//! # Components
//!
//! - [`transport::connect`]: open a TCP connection and send `JOIN`
//! - [`transport::attach`]: same, over any async byte stream
//! - [`ConnectedClient`]: handle for sending commands and receiving events
//! - [`ConnectionEvent`]: decoded lines and the terminal disconnect

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
pub mod transport;

pub use config::TransportConfig;
pub use error::TransportError;
pub use event::{ConnectionEvent, DisconnectReason};
pub use transport::{CLOSE_FLUSH_TIMEOUT, ConnectedClient, MAX_LINE_BYTES};
