//! Decoded server lines.

/// One decoded server line.
///
/// Every inbound line produces exactly one event. Lines that match no marker,
/// or whose range text is malformed, become [`ProtocolEvent::Unrecognized`]
/// and are still shown to the player as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// The local player may guess now.
    TurnGranted,

    /// The turn moved to someone.
    TurnTransferred {
        /// Whether the turn went to a player other than the local one.
        to_other: bool,
    },

    /// Server announced the new inclusive guess range.
    RangeUpdated {
        /// Lower bound (inclusive).
        min: i64,
        /// Upper bound (inclusive).
        max: i64,
    },

    /// The bomb went off. Terminal for the round.
    Exploded,

    /// Anything else, passed through as opaque text.
    Unrecognized {
        /// The line as received.
        raw: String,
    },
}
