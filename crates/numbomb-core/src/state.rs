//! Observable session state types.

use std::fmt;

/// Lower bound of the range before any update.
pub const DEFAULT_MIN: i64 = 0;

/// Upper bound of the range before any update.
pub const DEFAULT_MAX: i64 = 200;

/// Connection lifecycle as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport. Initial state, and the state after a clean close.
    #[default]
    Disconnected,
    /// Connect attempt in flight.
    Connecting,
    /// Transport open and `JOIN` sent.
    Connected,
    /// An established connection ended with a transport error.
    Failed,
}

impl ConnectionState {
    /// Whether outbound commands may be sent.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Whether a connect attempt is in flight or established.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Game phase, derived entirely from server messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Joined, round not started (or start not yet observed).
    #[default]
    AwaitingStart,
    /// Local player may guess.
    MyTurn,
    /// Someone else is guessing.
    OpponentTurn,
    /// Bomb went off. Terminal.
    Exploded,
}

impl Phase {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Exploded
    }
}

/// Inclusive guess range.
///
/// # Invariants
///
/// - `min <= max`, enforced by [`GuessRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuessRange {
    min: i64,
    max: i64,
}

impl GuessRange {
    /// Create a range. `None` if `min > max`.
    pub fn new(min: i64, max: i64) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// Lower bound (inclusive).
    pub fn min(self) -> i64 {
        self.min
    }

    /// Upper bound (inclusive).
    pub fn max(self) -> i64 {
        self.max
    }

    /// Whether `value` lies within the range.
    pub fn contains(self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for GuessRange {
    fn default() -> Self {
        Self { min: DEFAULT_MIN, max: DEFAULT_MAX }
    }
}

impl fmt::Display for GuessRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Immutable snapshot of the turn-relevant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnState {
    /// Current phase.
    pub phase: Phase,
    /// Current guess range.
    pub range: GuessRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_zero_to_two_hundred() {
        let range = GuessRange::default();
        assert_eq!((range.min(), range.max()), (0, 200));
        assert!(range.contains(0));
        assert!(range.contains(200));
        assert!(!range.contains(201));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(GuessRange::new(5, 4).is_none());
        assert!(GuessRange::new(4, 4).is_some());
    }

    #[test]
    fn only_connected_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Failed.is_live());
    }
}
