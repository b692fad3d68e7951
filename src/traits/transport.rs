//! Transport trait abstraction.
//!
//! The streamer never talks HTTP itself. It asks a [`Transport`] to open a
//! text-mode request and consumes the body as a stream of byte chunks,
//! which lets tests drive sessions with scripted chunks.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use crate::error::TransportError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Body of an open stream: chunks in arrival order, ending on clean close.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// `Accept` value required on every stream request.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// `Cache-Control` value required on every stream request.
pub const NO_CACHE: &str = "no-cache";

/// HTTP method of a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    /// Method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(format!("unsupported method '{}'", other)),
        }
    }
}

/// A request to open an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// HTTP method
    pub method: Method,
    /// Source descriptor (URL)
    pub url: String,
    /// Request headers
    pub headers: Headers,
}

impl StreamRequest {
    /// Create a GET request carrying the event-stream headers.
    pub fn new(url: impl Into<String>) -> Self {
        let mut request = Self {
            method: Method::Get,
            url: url.into(),
            headers: Headers::new(),
        };
        request.apply_stream_headers();
        request
    }

    /// Set the method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add extra headers. The event-stream headers cannot be overridden.
    pub fn with_headers(mut self, headers: &Headers) -> Self {
        for (key, value) in headers {
            self.headers.insert(key.clone(), value.clone());
        }
        self.apply_stream_headers();
        self
    }

    /// Look a header up ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn apply_stream_headers(&mut self) {
        self.headers
            .retain(|key, _| !key.eq_ignore_ascii_case("accept") && !key.eq_ignore_ascii_case("cache-control"));
        self.headers
            .insert("Accept".to_string(), EVENT_STREAM_CONTENT_TYPE.to_string());
        self.headers
            .insert("Cache-Control".to_string(), NO_CACHE.to_string());
    }
}

/// Trait for opening event-stream requests.
///
/// Implementations resolve once response headers are in and hand back the
/// body as a chunk stream. A non-success status must be reported as
/// [`TransportError::ServerError`] rather than as a stream.
///
/// Dropping the returned stream cancels the request.
///
/// # Example
///
/// ```ignore
/// use sse_tap::traits::{StreamRequest, Transport};
///
/// async fn first_chunk<T: Transport>(transport: &T) -> Option<bytes::Bytes> {
///     let mut body = transport.open(&StreamRequest::new("http://localhost/stream")).await.ok()?;
///     body.next().await?.ok()
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open the request and return its body.
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, TransportError>;
}
