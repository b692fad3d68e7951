//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`Transport`] - Opens a text-mode event-stream request

pub mod transport;

pub use transport::{
    ByteStream, Headers, Method, StreamRequest, Transport, EVENT_STREAM_CONTENT_TYPE, NO_CACHE,
};
