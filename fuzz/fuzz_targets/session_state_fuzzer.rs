//! Fuzz target for the Session state machine
//!
//! Drives arbitrary interleavings of intents, connect outcomes and server
//! events through a `Session`.
//!
//! # Invariants
//!
//! - Commands are only produced while connected
//! - A guess is only produced on our turn and inside the range
//! - Nothing leaves `Exploded` without a new join
//! - Every line delivered while connected yields exactly one `ServerText`

#![no_main]

use std::{io, sync::Arc};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use numbomb_app::{Notification, Session, SessionAction, SessionEvent};
use numbomb_client::{ConnectionEvent, DisconnectReason, TransportError};
use numbomb_core::{ConnectionState, Phase};
use numbomb_proto::ProtocolEvent;

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Join { name: String },
    ConnectSucceeded { stale: bool },
    ConnectFailed,
    Line(EventChoice),
    Disconnect { error: bool },
    Start,
    Status,
    Guess(i64),
    GuessText(String),
    Shutdown,
}

#[derive(Debug, Clone, Arbitrary)]
enum EventChoice {
    TurnGranted,
    TurnTransferred(bool),
    RangeUpdated(i64, i64),
    Exploded,
    Unrecognized(String),
}

impl From<EventChoice> for ProtocolEvent {
    fn from(choice: EventChoice) -> Self {
        match choice {
            EventChoice::TurnGranted => Self::TurnGranted,
            EventChoice::TurnTransferred(to_other) => Self::TurnTransferred { to_other },
            EventChoice::RangeUpdated(min, max) => Self::RangeUpdated { min, max },
            EventChoice::Exploded => Self::Exploded,
            EventChoice::Unrecognized(raw) => Self::Unrecognized { raw },
        }
    }
}

fuzz_target!(|ops: Vec<SessionOp>| {
    let mut session = Session::new("127.0.0.1:8889");
    let mut attempt: u64 = 0;

    for op in ops {
        let before = session.snapshot();
        let is_line = matches!(op, SessionOp::Line(_));
        let is_join = matches!(op, SessionOp::Join { .. });

        let actions = match op {
            SessionOp::Join { name } => session.request_join(&name).unwrap_or_default(),
            SessionOp::ConnectSucceeded { stale } => {
                let attempt = if stale { attempt.wrapping_sub(1) } else { attempt };
                session.handle(SessionEvent::Connected { attempt })
            },
            SessionOp::ConnectFailed => session.handle(SessionEvent::ConnectFailed {
                attempt,
                error: Arc::new(TransportError::Io(io::Error::other("refused"))),
            }),
            SessionOp::Line(choice) => {
                let event = ProtocolEvent::from(choice);
                session.handle(SessionEvent::Connection(ConnectionEvent::Line {
                    raw: format!("{event:?}"),
                    event,
                }))
            },
            SessionOp::Disconnect { error } => {
                let reason = if error {
                    DisconnectReason::ReadFailed("reset".into())
                } else {
                    DisconnectReason::PeerClosed
                };
                session.handle(SessionEvent::Connection(ConnectionEvent::Disconnected { reason }))
            },
            SessionOp::Start => session.request_start().unwrap_or_default(),
            SessionOp::Status => session.request_status().unwrap_or_default(),
            SessionOp::Guess(value) => session.request_guess(value).unwrap_or_default(),
            SessionOp::GuessText(text) => session.request_guess_text(&text).unwrap_or_default(),
            SessionOp::Shutdown => session.shutdown(),
        };

        let after = session.snapshot();
        let mut texts = 0;

        for action in &actions {
            match action {
                SessionAction::Connect { attempt: a, .. } => attempt = *a,
                SessionAction::Send(command) => {
                    assert_eq!(before.connection, ConnectionState::Connected, "{command} sent");
                    if let numbomb_proto::OutboundCommand::Guess { value, .. } = command {
                        assert_eq!(before.turn.phase, Phase::MyTurn);
                        assert!(before.turn.range.contains(*value));
                    }
                },
                SessionAction::Notify(Notification::ServerText { .. }) => texts += 1,
                _ => {},
            }
        }

        if before.turn.phase == Phase::Exploded && !is_join {
            assert_eq!(after.turn, before.turn, "left Exploded");
        }
        if is_line {
            assert_eq!(texts, usize::from(before.connection == ConnectionState::Connected));
        }
        assert!(after.turn.range.min() <= after.turn.range.max());
    }
});
