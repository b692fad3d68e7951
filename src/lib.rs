//! sse-tap - incremental server-sent events reader
//!
//! Reads a line-delimited event stream from a single long-lived HTTP
//! response that arrives in arbitrarily aligned chunks, rebuilds the
//! logical lines, and publishes `data`/`event` lines on a named-channel
//! event bus. Sessions are tagged with a generation so an aborted or
//! superseded session never leaks data into the next one.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod sse;
pub mod streamer;
pub mod traits;
