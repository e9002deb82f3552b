//! Session engine for number bomb
//!
//! Wires the connection manager into the turn state machine and exposes a
//! message-passing boundary to presentation layers.
//!
//! # Components
//!
//! - [`Session`]: pure state machine owning connection state and turn state
//! - [`Runtime`]: async actor that executes [`SessionAction`]s and feeds
//!   connection events back into the [`Session`]
//! - [`SessionHandle`]: cloneable sink for player intents
//! - [`Notification`]: what presentation layers observe

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod error;
mod event;
mod handle;
mod notification;
mod runtime;
mod session;
mod state;

pub use action::SessionAction;
pub use config::{DEFAULT_PORT, DEFAULT_SERVER_ADDR, SessionConfig};
pub use error::SessionError;
pub use event::SessionEvent;
pub use handle::SessionHandle;
pub use notification::{Notification, Notifications};
pub use numbomb_client::{DisconnectReason, TransportConfig, TransportError};
pub use runtime::Runtime;
pub use session::Session;
pub use state::SessionSnapshot;
