//! Session state machine.
//!
//! This module defines [`Session`], the single owner of connection state and
//! turn state. It is a pure state machine: player intents and
//! [`crate::SessionEvent`]s go in, [`crate::SessionAction`]s come out, and the
//! runtime performs the I/O.
//!
//! # Connection lifecycle
//!
//! ```text
//!                request_join
//! Disconnected ──────────────> Connecting ── ConnectFailed ──> Disconnected
//!      ↑                           │
//!      │ peer close / shutdown     │ Connected
//!      │                           ↓
//!      └──────────────────────  Connected ── read/write error ──> Failed
//! ```
//!
//! Every join builds a fresh [`TurnMachine`]; nothing carries over from an
//! earlier connection.

use numbomb_client::{ConnectionEvent, DisconnectReason};
use numbomb_core::{
    ConnectionState, Outcome, Phase, TurnMachine, ValidationError, parse_guess, validate_start,
};
use numbomb_proto::OutboundCommand;

use crate::{Notification, SessionAction, SessionEvent, SessionSnapshot};

/// Session state machine.
#[derive(Debug, Clone)]
pub struct Session {
    server_addr: String,
    /// Set by the most recent join request.
    player: Option<String>,
    connection: ConnectionState,
    turn: TurnMachine,
    /// Incremented per join and on shutdown, invalidating pending connects.
    attempt: u64,
}

impl Session {
    /// Create a disconnected session for `server_addr`.
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            player: None,
            connection: ConnectionState::Disconnected,
            turn: TurnMachine::new(),
            attempt: 0,
        }
    }

    /// Start a new connection as `name`.
    ///
    /// Rejected while a connection is being opened or is open.
    pub fn request_join(&mut self, name: &str) -> Result<Vec<SessionAction>, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyPlayerName);
        }
        if self.connection.is_live() {
            return Err(ValidationError::AlreadyConnected);
        }

        self.attempt += 1;
        self.player = Some(name.to_string());
        self.turn = TurnMachine::new();
        self.connection = ConnectionState::Connecting;

        Ok(vec![
            SessionAction::Notify(Notification::Connecting),
            SessionAction::Connect {
                attempt: self.attempt,
                server_addr: self.server_addr.clone(),
                player: name.to_string(),
            },
        ])
    }

    /// Ask the server to start the game.
    pub fn request_start(&self) -> Result<Vec<SessionAction>, ValidationError> {
        validate_start(self.connection)?;
        Ok(vec![SessionAction::Send(OutboundCommand::StartGame)])
    }

    /// Guess `value`.
    pub fn request_guess(&self, value: i64) -> Result<Vec<SessionAction>, ValidationError> {
        self.turn.validate_guess(value, self.connection)?;
        let player = self.player.as_deref().ok_or(ValidationError::NotConnected)?;
        Ok(vec![SessionAction::Send(OutboundCommand::guess(player, value))])
    }

    /// Guess from text typed by the player.
    ///
    /// Connection and turn are checked before the text is parsed.
    pub fn request_guess_text(&self, text: &str) -> Result<Vec<SessionAction>, ValidationError> {
        if !self.connection.is_connected() {
            return Err(ValidationError::NotConnected);
        }
        if self.turn.phase() != Phase::MyTurn {
            return Err(ValidationError::NotMyTurn { phase: self.turn.phase() });
        }
        self.request_guess(parse_guess(text)?)
    }

    /// Ask the server for a status report.
    pub fn request_status(&self) -> Result<Vec<SessionAction>, ValidationError> {
        if !self.connection.is_connected() {
            return Err(ValidationError::NotConnected);
        }
        Ok(vec![SessionAction::Send(OutboundCommand::Status)])
    }

    /// Whether a connection from `attempt` should be kept.
    pub fn accepts_connection(&self, attempt: u64) -> bool {
        attempt == self.attempt && self.connection == ConnectionState::Connecting
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Connected { attempt } => {
                if !self.accepts_connection(attempt) {
                    tracing::debug!(attempt, "ignoring stale connection");
                    return vec![];
                }
                self.connection = ConnectionState::Connected;
                vec![SessionAction::Notify(Notification::Connected)]
            },
            SessionEvent::ConnectFailed { attempt, error } => {
                if !self.accepts_connection(attempt) {
                    tracing::debug!(attempt, "ignoring stale connect failure");
                    return vec![];
                }
                self.connection = ConnectionState::Disconnected;
                vec![SessionAction::Notify(Notification::ConnectFailed { error })]
            },
            SessionEvent::Connection(event) => self.handle_connection(event),
        }
    }

    fn handle_connection(&mut self, event: ConnectionEvent) -> Vec<SessionAction> {
        if self.connection != ConnectionState::Connected {
            tracing::debug!(?event, state = ?self.connection, "connection event without connection");
            return vec![];
        }

        match event {
            ConnectionEvent::Line { raw, event } => {
                let mut actions = vec![SessionAction::Notify(Notification::ServerText { raw })];
                match self.turn.apply(&event) {
                    Outcome::Applied(transition) => {
                        actions.push(SessionAction::Notify(Notification::Transition {
                            event,
                            from: transition.from,
                            to: transition.to,
                        }));
                    },
                    Outcome::Ignored(reason) => tracing::debug!(?reason, "event ignored"),
                }
                actions
            },
            ConnectionEvent::Disconnected { reason } => {
                self.connection = if reason.is_error() {
                    ConnectionState::Failed
                } else {
                    ConnectionState::Disconnected
                };
                vec![
                    SessionAction::CloseConnection,
                    SessionAction::Notify(Notification::ConnectionLost { reason }),
                ]
            },
        }
    }

    /// End the session locally.
    ///
    /// Marks the session disconnected before the connection is closed, so no
    /// command is accepted while the transport shuts down.
    pub fn shutdown(&mut self) -> Vec<SessionAction> {
        if !self.connection.is_live() {
            return vec![];
        }

        self.attempt += 1;
        self.connection = ConnectionState::Disconnected;
        vec![
            SessionAction::CloseConnection,
            SessionAction::Notify(Notification::ConnectionLost {
                reason: DisconnectReason::LocalClose,
            }),
        ]
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Turn state machine.
    pub fn turn(&self) -> &TurnMachine {
        &self.turn
    }

    /// Name of the most recent join request.
    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    /// Server address (host:port).
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            player: self.player.clone(),
            server_addr: self.server_addr.clone(),
            connection: self.connection,
            turn: self.turn.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use numbomb_client::TransportError;
    use numbomb_core::GuessRange;
    use numbomb_proto::ProtocolEvent;

    use super::*;

    fn line(raw: &str, event: ProtocolEvent) -> SessionEvent {
        SessionEvent::Connection(ConnectionEvent::Line { raw: raw.to_string(), event })
    }

    fn connected(name: &str) -> Session {
        let mut session = Session::new("127.0.0.1:8889");
        session.request_join(name).unwrap();
        session.handle(SessionEvent::Connected { attempt: 1 });
        session
    }

    fn my_turn(name: &str) -> Session {
        let mut session = connected(name);
        session.handle(line("你的回合！", ProtocolEvent::TurnGranted));
        session
    }

    #[test]
    fn join_starts_connecting() {
        let mut session = Session::new("127.0.0.1:8889");
        let actions = session.request_join("  Bob ").unwrap();

        assert!(matches!(
            actions.as_slice(),
            [
                SessionAction::Notify(Notification::Connecting),
                SessionAction::Connect { attempt: 1, player, .. },
            ] if player == "Bob"
        ));
        assert_eq!(session.connection_state(), ConnectionState::Connecting);
        assert_eq!(session.player(), Some("Bob"));
    }

    #[test]
    fn join_rejects_empty_name() {
        let mut session = Session::new("127.0.0.1:8889");
        assert_eq!(session.request_join("   ").unwrap_err(), ValidationError::EmptyPlayerName);
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn join_while_live_is_rejected() {
        let mut session = Session::new("127.0.0.1:8889");
        session.request_join("Bob").unwrap();
        assert_eq!(session.request_join("Bob").unwrap_err(), ValidationError::AlreadyConnected);

        session.handle(SessionEvent::Connected { attempt: 1 });
        assert_eq!(session.request_join("Bob").unwrap_err(), ValidationError::AlreadyConnected);
    }

    #[test]
    fn connect_failure_returns_to_disconnected() {
        let mut session = Session::new("127.0.0.1:1");
        session.request_join("Bob").unwrap();

        let error = Arc::new(TransportError::Io(io::Error::other("refused")));
        let actions = session.handle(SessionEvent::ConnectFailed { attempt: 1, error });

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(Notification::ConnectFailed { .. })]
        ));
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn stale_connect_results_are_ignored() {
        let mut session = Session::new("127.0.0.1:8889");
        session.request_join("Bob").unwrap();
        session.shutdown();
        session.request_join("Bob").unwrap();

        assert!(!session.accepts_connection(1));
        assert!(session.handle(SessionEvent::Connected { attempt: 1 }).is_empty());
        assert_eq!(session.connection_state(), ConnectionState::Connecting);

        assert!(session.accepts_connection(2));
    }

    #[test]
    fn line_publishes_text_then_transition() {
        let mut session = connected("Bob");
        let actions = session.handle(line("新范围: 10-50", ProtocolEvent::RangeUpdated {
            min: 10,
            max: 50,
        }));

        assert!(matches!(
            actions.as_slice(),
            [
                SessionAction::Notify(Notification::ServerText { .. }),
                SessionAction::Notify(Notification::Transition { to, .. }),
            ] if to.range == GuessRange::new(10, 50).unwrap()
        ));
    }

    #[test]
    fn unrecognized_line_publishes_text_only() {
        let mut session = connected("Bob");
        let before = session.snapshot();
        let actions = session.handle(line("新范围: x-y", ProtocolEvent::Unrecognized {
            raw: "新范围: x-y".into(),
        }));

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(Notification::ServerText { raw })] if raw == "新范围: x-y"
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn guess_requires_turn_and_range() {
        let session = connected("Bob");
        assert_eq!(
            session.request_guess(5).unwrap_err(),
            ValidationError::NotMyTurn { phase: Phase::AwaitingStart }
        );

        let session = my_turn("Bob");
        assert!(matches!(
            session.request_guess(300).unwrap_err(),
            ValidationError::OutOfRange { value: 300, .. }
        ));

        let actions = session.request_guess(42).unwrap();
        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Send(OutboundCommand::Guess { name, value: 42 })] if name == "Bob"
        ));
    }

    #[test]
    fn guess_text_checks_turn_before_parsing() {
        let session = connected("Bob");
        assert_eq!(
            session.request_guess_text("abc").unwrap_err(),
            ValidationError::NotMyTurn { phase: Phase::AwaitingStart }
        );

        let session = my_turn("Bob");
        assert_eq!(session.request_guess_text("  ").unwrap_err(), ValidationError::EmptyGuess);
        assert_eq!(
            session.request_guess_text("abc").unwrap_err(),
            ValidationError::NotANumber { input: "abc".into() }
        );
        assert!(session.request_guess_text(" 17 ").is_ok());
    }

    #[test]
    fn start_and_status_only_need_connection() {
        let session = Session::new("127.0.0.1:8889");
        assert_eq!(session.request_start().unwrap_err(), ValidationError::NotConnected);
        assert_eq!(session.request_status().unwrap_err(), ValidationError::NotConnected);

        let session = connected("Bob");
        assert!(matches!(
            session.request_start().unwrap().as_slice(),
            [SessionAction::Send(OutboundCommand::StartGame)]
        ));
        assert!(matches!(
            session.request_status().unwrap().as_slice(),
            [SessionAction::Send(OutboundCommand::Status)]
        ));
    }

    #[test]
    fn peer_close_after_explosion_keeps_phase() {
        let mut session = connected("Bob");
        session.handle(line("炸弹爆炸", ProtocolEvent::Exploded));

        let actions = session.handle(SessionEvent::Connection(ConnectionEvent::Disconnected {
            reason: DisconnectReason::PeerClosed,
        }));

        assert!(matches!(
            actions.as_slice(),
            [
                SessionAction::CloseConnection,
                SessionAction::Notify(Notification::ConnectionLost {
                    reason: DisconnectReason::PeerClosed
                }),
            ]
        ));
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.turn().phase(), Phase::Exploded);
    }

    #[test]
    fn read_error_marks_failed() {
        let mut session = connected("Bob");
        session.handle(SessionEvent::Connection(ConnectionEvent::Disconnected {
            reason: DisconnectReason::ReadFailed("reset".into()),
        }));

        assert_eq!(session.connection_state(), ConnectionState::Failed);
        assert_eq!(session.request_start().unwrap_err(), ValidationError::NotConnected);
    }

    #[test]
    fn rejoin_rebuilds_turn_state() {
        let mut session = connected("Bob");
        session.handle(line("炸弹爆炸", ProtocolEvent::Exploded));
        session.handle(SessionEvent::Connection(ConnectionEvent::Disconnected {
            reason: DisconnectReason::PeerClosed,
        }));

        session.request_join("Carol").unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.turn.phase, Phase::AwaitingStart);
        assert_eq!(snapshot.turn.range, GuessRange::default());
        assert_eq!(snapshot.player.as_deref(), Some("Carol"));
    }

    #[test]
    fn shutdown_marks_disconnected_before_close() {
        let mut session = connected("Bob");
        let actions = session.shutdown();

        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(matches!(
            actions.as_slice(),
            [
                SessionAction::CloseConnection,
                SessionAction::Notify(Notification::ConnectionLost {
                    reason: DisconnectReason::LocalClose
                }),
            ]
        ));
        assert!(session.shutdown().is_empty());
    }

    #[test]
    fn lines_after_disconnect_are_dropped() {
        let mut session = Session::new("127.0.0.1:8889");
        assert!(session.handle(line("你的回合", ProtocolEvent::TurnGranted)).is_empty());
        assert_eq!(session.turn().phase(), Phase::AwaitingStart);
    }
}
