//! Error handling for sse-tap.
//!
//! Errors fall into a small taxonomy:
//!
//! | Kind | Type | Surfaced as |
//! |------|------|-------------|
//! | Transport failure | [`TransportError`] | `error` channel + failed completion |
//! | Session task died (subscriber panic) | [`StreamError::Interrupted`] | failed completion |
//! | Bad config file, env var or header flag | [`ConfigError`] | returned to the binary |
//! | Malformed or unknown line | none | silently dropped |
//! | Stale callback | none | suppressed by generation check |
//!
//! Nothing is retried automatically. [`TransportError::is_retryable`] only
//! tells callers whether starting a new session is worth it.

mod config;
mod result;
mod stream;
mod transport;

pub use config::ConfigError;
pub use result::SseTapResult;
pub use stream::StreamError;
pub use transport::{classify_reqwest_error, TransportError};
