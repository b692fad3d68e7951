//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestTransport`] - Event-stream transport using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockTransport`] - Scripted chunk sequences and live feeds

pub mod mock;
pub mod reqwest_transport;

pub use mock::{MockFeed, MockResponse, MockTransport};
pub use reqwest_transport::ReqwestTransport;
