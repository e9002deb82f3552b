//! Async runtime for the session engine.
//!
//! The Runtime is the only code that touches a [`ConnectedClient`]. One task
//! serially drains three sources, so session state needs no locks:
//! - player intents from [`SessionHandle`]s
//! - results of connect attempts, which run in their own task
//! - the receive sequence of the open connection
//!
//! Each source is turned into [`SessionAction`]s by the [`Session`] and
//! executed here.

use std::sync::Arc;

use numbomb_client::{
    ConnectedClient, ConnectionEvent, DisconnectReason, TransportError, transport,
};
use numbomb_core::ValidationError;
use numbomb_proto::OutboundCommand;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    Notification, Notifications, Session, SessionAction, SessionConfig, SessionEvent,
    SessionHandle,
    handle::{Intent, Reply},
};

/// Pending intents before [`SessionHandle`] calls start waiting.
const INTENT_QUEUE: usize = 32;

type ConnectResult = (u64, Result<ConnectedClient, TransportError>);

/// Engine task state.
pub struct Runtime {
    config: SessionConfig,
    session: Session,
    /// Open connection. `Some` only while the session is connected.
    connection: Option<ConnectedClient>,
    /// Connect attempt in flight.
    connecting: Option<JoinHandle<()>>,
    intents: mpsc::Receiver<Intent>,
    connect_tx: mpsc::UnboundedSender<ConnectResult>,
    connect_rx: mpsc::UnboundedReceiver<ConnectResult>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl Runtime {
    /// Create an engine without starting it.
    ///
    /// Drive it with [`Runtime::run`]; [`Runtime::spawn`] does both.
    pub fn new(config: SessionConfig) -> (Self, SessionHandle, Notifications) {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE);
        let (connect_tx, connect_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            session: Session::new(config.server_addr.clone()),
            config,
            connection: None,
            connecting: None,
            intents: intent_rx,
            connect_tx,
            connect_rx,
            notifications: notify_tx,
        };

        (runtime, SessionHandle::new(intent_tx), notify_rx)
    }

    /// Start an engine on the current tokio runtime.
    pub fn spawn(config: SessionConfig) -> (SessionHandle, Notifications) {
        let (runtime, handle, notifications) = Self::new(config);
        tokio::spawn(runtime.run());
        (handle, notifications)
    }

    /// Run until shut down or until every [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        tracing::debug!(server = %self.config.server_addr, "session engine started");

        loop {
            tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(intent) => {
                        if self.handle_intent(intent).await {
                            break;
                        }
                    },
                    None => {
                        tracing::debug!("all session handles dropped");
                        self.teardown().await;
                        break;
                    },
                },

                Some((attempt, result)) = self.connect_rx.recv() => {
                    self.handle_connect_result(attempt, result).await;
                },

                event = next_connection_event(&mut self.connection) => {
                    self.handle_connection_event(event).await;
                },
            }
        }

        tracing::debug!("session engine stopped");
    }

    /// Returns `true` once the engine should stop.
    async fn handle_intent(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Join { name, reply } => {
                let result = self.session.request_join(&name);
                self.respond(result, reply).await;
            },
            Intent::Start { reply } => {
                let result = self.session.request_start();
                self.respond(result, reply).await;
            },
            Intent::Guess { value, reply } => {
                let result = self.session.request_guess(value);
                self.respond(result, reply).await;
            },
            Intent::GuessText { text, reply } => {
                let result = self.session.request_guess_text(&text);
                self.respond(result, reply).await;
            },
            Intent::Status { reply } => {
                let result = self.session.request_status();
                self.respond(result, reply).await;
            },
            Intent::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            },
            Intent::Shutdown { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return true;
            },
        }
        false
    }

    /// Execute the actions of an accepted intent, then reply.
    ///
    /// A command the connection no longer takes fails the request with
    /// [`ValidationError::NotConnected`].
    async fn respond(&mut self, result: Result<Vec<SessionAction>, ValidationError>, reply: Reply) {
        let verdict = match result {
            Ok(actions) => self.execute(actions).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &verdict {
            tracing::debug!(error = %e, "request rejected");
        }
        let _ = reply.send(verdict);
    }

    async fn handle_connect_result(
        &mut self,
        attempt: u64,
        result: Result<ConnectedClient, TransportError>,
    ) {
        if self.session.accepts_connection(attempt) {
            self.connecting = None;
        }

        match result {
            Ok(client) if self.session.accepts_connection(attempt) => {
                // Stored before the session reacts so `Connected` is published
                // before any line from this connection is polled.
                self.connection = Some(client);
                let actions = self.session.handle(SessionEvent::Connected { attempt });
                self.react(actions).await;
            },
            Ok(client) => {
                tracing::debug!(attempt, "closing connection from stale attempt");
                client.close().await;
            },
            Err(error) => {
                tracing::warn!(server = %self.config.server_addr, error = %error, "connect failed");
                let actions = self
                    .session
                    .handle(SessionEvent::ConnectFailed { attempt, error: Arc::new(error) });
                self.react(actions).await;
            },
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        let ended = matches!(event, ConnectionEvent::Disconnected { .. });
        let actions = self.session.handle(SessionEvent::Connection(event));
        self.react(actions).await;

        // The receive sequence is finished; never poll it again.
        if ended {
            self.close_connection().await;
        }
    }

    /// Execute actions in order. Fails if a command could not be handed to
    /// the connection; the remaining actions still run.
    async fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), ValidationError> {
        let mut outcome = Ok(());
        for action in actions {
            match action {
                SessionAction::Connect { attempt, server_addr, player } => {
                    self.start_connect(attempt, server_addr, player);
                },
                SessionAction::Send(command) => {
                    if let Err(e) = self.send(command) {
                        outcome = Err(e);
                    }
                },
                SessionAction::Notify(notification) => self.publish(notification),
                SessionAction::CloseConnection => self.close_connection().await,
            }
        }
        outcome
    }

    /// Execute actions caused by an event rather than a request.
    async fn react(&mut self, actions: Vec<SessionAction>) {
        if let Err(e) = self.execute(actions).await {
            tracing::warn!(error = %e, "command dropped");
        }
    }

    fn start_connect(&mut self, attempt: u64, server_addr: String, player: String) {
        if let Some(previous) = self.connecting.take() {
            previous.abort();
        }

        let results = self.connect_tx.clone();
        let config = self.config.transport.clone();
        self.connecting = Some(tokio::spawn(async move {
            tracing::info!(server = %server_addr, %player, attempt, "connecting");
            let result = transport::connect_with_config(&server_addr, &player, &config).await;
            if let Err(mpsc::error::SendError((_, Ok(client)))) = results.send((attempt, result)) {
                client.close().await;
            }
        }));
    }

    /// Hand a command to the writer. `CommandSent` is published only on
    /// success.
    fn send(&self, command: OutboundCommand) -> Result<(), ValidationError> {
        let Some(client) = &self.connection else {
            tracing::warn!(%command, "no open connection; command dropped");
            return Err(ValidationError::NotConnected);
        };

        match client.send(command.clone()) {
            Ok(()) => {
                self.publish(Notification::CommandSent { command });
                Ok(())
            },
            Err(e) => {
                // The writer is gone; its disconnect has not been handled yet.
                tracing::warn!(%command, error = %e, "failed to queue command");
                Err(ValidationError::NotConnected)
            },
        }
    }

    fn publish(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::trace!("no notification subscriber");
        }
    }

    async fn close_connection(&mut self) {
        if let Some(client) = self.connection.take() {
            client.close().await;
        }
    }

    /// Close everything the engine owns.
    async fn teardown(&mut self) {
        if let Some(connecting) = self.connecting.take() {
            connecting.abort();
        }

        let actions = self.session.shutdown();
        self.react(actions).await;
        self.close_connection().await;

        while let Ok((_, result)) = self.connect_rx.try_recv() {
            if let Ok(client) = result {
                client.close().await;
            }
        }
    }
}

/// Next item from the open connection. Pending while there is none.
async fn next_connection_event(connection: &mut Option<ConnectedClient>) -> ConnectionEvent {
    match connection {
        Some(client) => client.recv().await.unwrap_or_else(|| ConnectionEvent::Disconnected {
            reason: DisconnectReason::ReadFailed("receive loop ended unexpectedly".to_string()),
        }),
        None => std::future::pending().await,
    }
}
