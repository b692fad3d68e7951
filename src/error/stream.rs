//! Session-level error types.
//!
//! A session fails either because its transport failed, or because the
//! task driving it went away before settling (a subscriber panicked, or
//! the runtime shut down).

use thiserror::Error;

use super::TransportError;

/// Error returned by a session's [`Completion`](crate::streamer::Completion).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The transport failed to open or broke mid-stream.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session task ended without settling its completion.
    #[error("Stream session was interrupted before it settled")]
    Interrupted,
}

impl StreamError {
    /// Check if starting a new session could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Transport(err) => err.is_retryable(),
            StreamError::Interrupted => false,
        }
    }

    /// The transport failure behind this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            StreamError::Transport(err) => Some(err),
            StreamError::Interrupted => None,
        }
    }
}
