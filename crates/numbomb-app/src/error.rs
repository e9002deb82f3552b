//! Errors returned to presentation layers.

use numbomb_core::ValidationError;
use thiserror::Error;

/// Why a request through [`crate::SessionHandle`] failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine task is no longer running.
    #[error("session engine is not running")]
    EngineStopped,
}
