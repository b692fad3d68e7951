//! Mock implementations for testing.
//!
//! - [`MockTransport`] - Scripted or live-fed event streams with request recording

pub mod transport;

pub use transport::{MockFeed, MockResponse, MockTransport};
