//! Text codec.
//!
//! Server lines are matched by content, and the markers are not mutually
//! exclusive (a status line can mention both a turn and a range), so
//! [`decode`] checks them in a fixed priority order:
//!
//! 1. your turn
//! 2. turn passed to someone else
//! 3. new range
//! 4. bomb exploded
//! 5. anything else
//!
//! Commands are encoded as `:`-delimited text with no escaping.

use crate::{OutboundCommand, ProtocolEvent, RangeParseError};

/// Marker for "your turn".
pub const YOUR_TURN_MARKER: &str = "你的回合";

/// Marker for "turn passed to <name>".
pub const TURN_PASSED_MARKER: &str = "轮到";

/// Marker preceding `<min>-<max>` in a range update.
pub const NEW_RANGE_MARKER: &str = "新范围:";

/// Marker for "bomb exploded".
pub const EXPLODED_MARKER: &str = "炸弹爆炸";

/// Terminates every encoded command on the wire.
pub const LINE_TERMINATOR: char = '\n';

/// Decode one server line into an event.
///
/// `local_player` is needed to tell "turn passed to someone else" apart from
/// the broadcast announcing our own turn: a turn-passed line that mentions
/// the local player falls through to the later checks.
///
/// Never fails. Malformed range text becomes [`ProtocolEvent::Unrecognized`].
pub fn decode(line: &str, local_player: &str) -> ProtocolEvent {
    if line.contains(YOUR_TURN_MARKER) {
        return ProtocolEvent::TurnGranted;
    }

    if line.contains(TURN_PASSED_MARKER) && !line.contains(local_player) {
        return ProtocolEvent::TurnTransferred { to_other: true };
    }

    if line.contains(NEW_RANGE_MARKER) {
        return match parse_range(line) {
            Ok((min, max)) => ProtocolEvent::RangeUpdated { min, max },
            Err(e) => {
                tracing::debug!(line, error = %e, "malformed range line");
                ProtocolEvent::Unrecognized { raw: line.to_string() }
            },
        };
    }

    if line.contains(EXPLODED_MARKER) {
        return ProtocolEvent::Exploded;
    }

    ProtocolEvent::Unrecognized { raw: line.to_string() }
}

/// Extract `(min, max)` from the text following [`NEW_RANGE_MARKER`].
///
/// The remainder of the line must split on `-` into exactly two integers;
/// whitespace around each bound is ignored. Bounds are returned as sent,
/// without checking `min <= max`.
pub fn parse_range(line: &str) -> Result<(i64, i64), RangeParseError> {
    let start = line.find(NEW_RANGE_MARKER).ok_or(RangeParseError::MissingMarker)?;
    let rest = &line[start + NEW_RANGE_MARKER.len()..];

    let parts: Vec<&str> = rest.split('-').collect();
    let [min, max] = parts.as_slice() else {
        return Err(RangeParseError::BoundCount { found: parts.len() });
    };

    Ok((parse_bound(min)?, parse_bound(max)?))
}

fn parse_bound(text: &str) -> Result<i64, RangeParseError> {
    let text = text.trim();
    text.parse().map_err(|source| RangeParseError::InvalidBound { text: text.to_string(), source })
}

/// Encode a command without its line terminator.
pub fn encode(command: &OutboundCommand) -> String {
    command.to_string()
}

/// Encode a command as it goes on the wire, terminator included.
pub fn encode_line(command: &OutboundCommand) -> String {
    let mut line = encode(command);
    line.push(LINE_TERMINATOR);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn your_turn_wins_over_everything() {
        let event = decode("你的回合！请输入一个数字: 新范围: 1-2", "Bob");
        assert_eq!(event, ProtocolEvent::TurnGranted);
    }

    #[test]
    fn turn_passed_to_other_player() {
        let event = decode("轮到 Alice 猜数字 (范围: 0-200)", "Bob");
        assert_eq!(event, ProtocolEvent::TurnTransferred { to_other: true });
    }

    #[test]
    fn turn_passed_to_local_player_falls_through() {
        let event = decode("轮到 Bob 猜数字 (范围: 0-200)", "Bob");
        assert!(matches!(event, ProtocolEvent::Unrecognized { .. }));
    }

    #[test]
    fn new_range_with_space_after_marker() {
        assert_eq!(decode("新范围: 10-50", "Bob"), ProtocolEvent::RangeUpdated { min: 10, max: 50 });
        assert_eq!(decode("新范围:10-50", "Bob"), ProtocolEvent::RangeUpdated { min: 10, max: 50 });
    }

    #[test]
    fn malformed_range_is_unrecognized() {
        for line in ["新范围: abc-50", "新范围: 10", "新范围: 1-2-3", "新范围:"] {
            assert_eq!(decode(line, "Bob"), ProtocolEvent::Unrecognized { raw: line.to_string() });
        }
    }

    #[test]
    fn inverted_range_still_decodes() {
        assert_eq!(decode("新范围: 50-10", "Bob"), ProtocolEvent::RangeUpdated { min: 50, max: 10 });
    }

    #[test]
    fn explosion_line_contains_dash_but_no_range_marker() {
        let event = decode("Alice 猜测: 42 - 炸弹爆炸！游戏结束！", "Bob");
        assert_eq!(event, ProtocolEvent::Exploded);
    }

    #[test]
    fn parse_range_reports_cause() {
        assert_eq!(parse_range("nothing here"), Err(RangeParseError::MissingMarker));
        assert_eq!(parse_range("新范围: 7"), Err(RangeParseError::BoundCount { found: 1 }));
        assert!(matches!(
            parse_range("新范围: x-7"),
            Err(RangeParseError::InvalidBound { ref text, .. }) if text == "x"
        ));
    }

    #[test]
    fn encode_formats() {
        assert_eq!(encode(&OutboundCommand::join("Bob")), "JOIN:Bob");
        assert_eq!(encode(&OutboundCommand::StartGame), "START:");
        assert_eq!(encode(&OutboundCommand::guess("Bob", 42)), "GUESS:Bob:42");
        assert_eq!(encode(&OutboundCommand::Status), "STATUS:");
    }

    #[test]
    fn encode_line_appends_single_newline() {
        assert_eq!(encode_line(&OutboundCommand::StartGame), "START:\n");
    }
}
