//! Presentation boundary.
//!
//! [`SessionHandle`] forwards player intents to the engine task and waits
//! for the verdict. A request that returns `Ok` has been validated and its
//! command handed to the connection; a rejected request sent nothing.

use numbomb_core::ValidationError;
use tokio::sync::{mpsc, oneshot};

use crate::{SessionError, SessionSnapshot};

/// Verdict on one intent.
pub(crate) type Reply = oneshot::Sender<Result<(), ValidationError>>;

/// Requests drained by the engine task.
#[derive(Debug)]
pub(crate) enum Intent {
    Join { name: String, reply: Reply },
    Start { reply: Reply },
    Guess { value: i64, reply: Reply },
    GuessText { text: String, reply: Reply },
    Status { reply: Reply },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Cloneable handle to a running engine.
///
/// Dropping every handle shuts the engine down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    intents: mpsc::Sender<Intent>,
}

impl SessionHandle {
    pub(crate) fn new(intents: mpsc::Sender<Intent>) -> Self {
        Self { intents }
    }

    /// Connect and join as `name`.
    ///
    /// Returns once the connect attempt has started. The outcome arrives as
    /// [`crate::Notification::Connected`] or
    /// [`crate::Notification::ConnectFailed`].
    pub async fn request_join(&self, name: impl Into<String>) -> Result<(), SessionError> {
        let name = name.into();
        self.request(|reply| Intent::Join { name, reply }).await
    }

    /// Ask the server to start the game.
    pub async fn request_start(&self) -> Result<(), SessionError> {
        self.request(|reply| Intent::Start { reply }).await
    }

    /// Guess `value`.
    pub async fn request_guess(&self, value: i64) -> Result<(), SessionError> {
        self.request(|reply| Intent::Guess { value, reply }).await
    }

    /// Guess from text typed by the player.
    pub async fn request_guess_text(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.request(|reply| Intent::GuessText { text, reply }).await
    }

    /// Ask the server for a status report.
    pub async fn request_status(&self) -> Result<(), SessionError> {
        self.request(|reply| Intent::Status { reply }).await
    }

    /// Current session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, verdict) = oneshot::channel();
        self.intents
            .send(Intent::Snapshot { reply })
            .await
            .map_err(|_| SessionError::EngineStopped)?;
        verdict.await.map_err(|_| SessionError::EngineStopped)
    }

    /// Close the connection and stop the engine.
    ///
    /// Returns after teardown has finished. Does nothing if the engine has
    /// already stopped.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.intents.send(Intent::Shutdown { reply }).await.is_err() {
            return;
        }
        let _ = done.await;
    }

    async fn request(&self, intent: impl FnOnce(Reply) -> Intent) -> Result<(), SessionError> {
        let (reply, verdict) = oneshot::channel();
        self.intents.send(intent(reply)).await.map_err(|_| SessionError::EngineStopped)?;
        verdict.await.map_err(|_| SessionError::EngineStopped)?.map_err(SessionError::from)
    }
}
