//! Reqwest-based transport adapter.
//!
//! Opens the request with reqwest and exposes the response body through
//! `bytes_stream()`, so chunks reach the parser as soon as they arrive
//! instead of being buffered into one opaque body.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::error::{classify_reqwest_error, TransportError};
use crate::traits::{ByteStream, Headers, Method, StreamRequest, Transport, EVENT_STREAM_CONTENT_TYPE};

/// Transport implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use sse_tap::adapters::ReqwestTransport;
/// use sse_tap::streamer::Streamer;
///
/// let streamer = Streamer::new(ReqwestTransport::new());
/// streamer.start_streaming("https://example.org/stream").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport around a custom reqwest::Client.
    ///
    /// Useful for proxies or TLS settings. Avoid a total request timeout:
    /// it would cut long-lived streams.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        let builder = Self::apply_headers(builder, &request.headers);

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with(EVENT_STREAM_CONTENT_TYPE) {
            warn!(
                url = %request.url,
                content_type,
                "Response is not an event stream, reading it as text anyway"
            );
        }
        debug!(url = %request.url, status = status.as_u16(), "Stream opened");

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| classify_reqwest_error(&e)));

        Ok(Box::pin(stream))
    }
}
