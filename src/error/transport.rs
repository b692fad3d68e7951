//! Transport-level error types.
//!
//! These errors describe failures of the underlying HTTP request: the
//! connection could not be opened, the server answered with a non-success
//! status, or the body stream broke mid-flight. They are surfaced verbatim
//! on the `error` channel and through the session's completion.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::traits::Transport).
///
/// Cloneable so the same detail can be published to subscribers and
/// returned from the completion future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request or body read timed out.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Body stream failed after the response started.
    #[error("IO error: {0}")]
    Io(String),

    /// The source descriptor was not a usable URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Anything else.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Check if this error is likely transient.
    ///
    /// The streamer never retries on its own; this is a hint for callers
    /// deciding whether to start a new session.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed(_)
            | TransportError::Timeout(_)
            | TransportError::Io(_) => true,
            TransportError::ServerError { status, .. } => *status >= 500 || *status == 429,
            TransportError::InvalidUrl(_) | TransportError::Other(_) => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed(_) => {
                "Could not connect to the event stream.".to_string()
            }
            TransportError::Timeout(_) => "The event stream timed out.".to_string(),
            TransportError::ServerError { status, .. } => {
                format!("The server rejected the stream request ({}).", status)
            }
            TransportError::Io(_) => "The event stream was interrupted.".to_string(),
            TransportError::InvalidUrl(url) => format!("'{}' is not a valid stream URL.", url),
            TransportError::Other(msg) => format!("Stream transport failed: {}", msg),
        }
    }
}

/// Classify a reqwest error into a [`TransportError`].
pub fn classify_reqwest_error(err: &reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::ConnectionFailed(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::ServerError {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        TransportError::Io(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::ConnectionFailed("refused".to_string()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(
            TransportError::Timeout("30s".to_string()).to_string(),
            "Request timeout: 30s"
        );
        assert_eq!(
            TransportError::ServerError {
                status: 503,
                message: "unavailable".to_string()
            }
            .to_string(),
            "Server error (503): unavailable"
        );
        assert_eq!(
            TransportError::Io("reset".to_string()).to_string(),
            "IO error: reset"
        );
        assert_eq!(
            TransportError::InvalidUrl("nope".to_string()).to_string(),
            "Invalid URL: nope"
        );
        assert_eq!(
            TransportError::Other("boom".to_string()).to_string(),
            "Transport error: boom"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(TransportError::ConnectionFailed(String::new()).is_retryable());
        assert!(TransportError::Timeout(String::new()).is_retryable());
        assert!(TransportError::Io(String::new()).is_retryable());
        assert!(TransportError::ServerError {
            status: 502,
            message: String::new()
        }
        .is_retryable());
        assert!(TransportError::ServerError {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!TransportError::ServerError {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!TransportError::InvalidUrl(String::new()).is_retryable());
    }

    #[test]
    fn test_status() {
        let err = TransportError::ServerError {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(TransportError::Io("x".to_string()).status(), None);
    }

    #[test]
    fn test_user_message_mentions_status() {
        let err = TransportError::ServerError {
            status: 500,
            message: "internal".to_string(),
        };
        assert!(err.user_message().contains("500"));
    }

    #[tokio::test]
    async fn test_classify_invalid_url() {
        let err = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            classify_reqwest_error(&err),
            TransportError::InvalidUrl(_)
        ));
    }
}
