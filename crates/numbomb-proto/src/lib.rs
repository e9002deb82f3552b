//! Number bomb wire protocol.
//!
//! The protocol is newline-delimited plain text. Client commands are
//! `:`-delimited (`JOIN:<name>`, `START:`, `GUESS:<name>:<value>`,
//! `STATUS:`). Server lines carry no fixed fields and are matched by content,
//! so decoding is a prioritized sequence of substring checks rather than a
//! grammar.
//!
//! # Components
//!
//! - [`ProtocolEvent`]: one decoded server line
//! - [`OutboundCommand`]: one client command
//! - [`decode`] / [`encode`]: the codec itself

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod command;
pub mod errors;
mod event;

pub use codec::{
    EXPLODED_MARKER, LINE_TERMINATOR, NEW_RANGE_MARKER, TURN_PASSED_MARKER, YOUR_TURN_MARKER,
    decode, encode, encode_line, parse_range,
};
pub use command::OutboundCommand;
pub use errors::RangeParseError;
pub use event::ProtocolEvent;
