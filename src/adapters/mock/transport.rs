//! Mock transport for testing.
//!
//! Serves scripted chunk sequences per URL, or live feeds that a test
//! pushes into one increment at a time, and records every request it sees.

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::traits::{ByteStream, StreamRequest, Transport};

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Yield the chunks, then end cleanly
    Stream(Vec<Bytes>),
    /// Yield the chunks, then stay open until cancelled
    Hang(Vec<Bytes>),
    /// Yield the chunks, then fail with the error
    StreamError {
        chunks: Vec<Bytes>,
        error: TransportError,
    },
    /// Fail before any body is produced
    OpenError(TransportError),
}

impl MockResponse {
    /// Build a cleanly ending stream from text increments.
    pub fn text<I, S>(increments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(to_chunks(increments))
    }

    /// Build a stream that never ends on its own from text increments.
    pub fn hanging<I, S>(increments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Hang(to_chunks(increments))
    }
}

fn to_chunks<I, S>(increments: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    increments
        .into_iter()
        .map(|s| Bytes::from(s.into()))
        .collect()
}

type FeedReceiver = mpsc::UnboundedReceiver<Result<Bytes, TransportError>>;

/// Sending half of a live feed created by [`MockTransport::feed`].
///
/// Dropping it (or calling [`close`](MockFeed::close)) ends the stream
/// cleanly.
#[derive(Debug, Clone)]
pub struct MockFeed {
    tx: mpsc::UnboundedSender<Result<Bytes, TransportError>>,
}

impl MockFeed {
    /// Push a text increment.
    pub fn send(&self, text: &str) {
        self.send_bytes(Bytes::copy_from_slice(text.as_bytes()));
    }

    /// Push a raw byte chunk.
    pub fn send_bytes(&self, chunk: Bytes) {
        let _ = self.tx.unbounded_send(Ok(chunk));
    }

    /// Break the stream with an error.
    pub fn fail(&self, error: TransportError) {
        let _ = self.tx.unbounded_send(Err(error));
    }

    /// End the stream cleanly.
    pub fn close(&self) {
        self.tx.close_channel();
    }

    /// Whether the consumer dropped the stream (cancelled the request).
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Mock transport for testing.
///
/// # Example
///
/// ```ignore
/// use sse_tap::adapters::mock::{MockResponse, MockTransport};
///
/// let transport = MockTransport::new();
/// transport.set_response("http://test/stream", MockResponse::text(["data: hel", "lo\n"]));
///
/// let streamer = Streamer::new(transport.clone());
/// streamer.start_streaming("http://test/stream").await?;
/// assert_eq!(transport.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// Configured responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Live feeds, consumed by the first request to their URL
    feeds: Arc<Mutex<HashMap<String, FeedReceiver>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<StreamRequest>>>,
}

impl MockTransport {
    /// Create a mock transport with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a URL.
    ///
    /// Matched exactly first, then as a prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Set a response for URLs without a specific match.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Create a live feed for the next request to `url`.
    pub fn feed(&self, url: &str) -> MockFeed {
        let (tx, rx) = mpsc::unbounded();
        self.feeds.lock().unwrap().insert(url.to_string(), rx);
        MockFeed { tx }
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern.as_str()) {
                return Some(response.clone());
            }
        }

        self.default_response.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(rx) = self.feeds.lock().unwrap().remove(&request.url) {
            return Ok(Box::pin(rx));
        }

        match self.get_response(&request.url) {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
            }
            Some(MockResponse::Hang(chunks)) => Ok(Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::pending()),
            )),
            Some(MockResponse::StreamError { chunks, error }) => Ok(Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::once(async move { Err(error) })),
            )),
            Some(MockResponse::OpenError(error)) => Err(error),
            None => Err(TransportError::Other(format!(
                "No mock response for URL: {}",
                request.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut body: ByteStream) -> Vec<Result<Bytes, TransportError>> {
        let mut items = Vec::new();
        while let Some(item) = body.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_scripted_stream() {
        let transport = MockTransport::new();
        transport.set_response("http://test/a", MockResponse::text(["one", "two"]));

        let body = transport
            .open(&StreamRequest::new("http://test/a"))
            .await
            .unwrap();
        let items = collect(body).await;
        assert_eq!(
            items,
            vec![Ok(Bytes::from("one")), Ok(Bytes::from("two"))]
        );
    }

    #[tokio::test]
    async fn test_stream_error_after_chunks() {
        let transport = MockTransport::new();
        transport.set_response(
            "http://test/err",
            MockResponse::StreamError {
                chunks: vec![Bytes::from("data: 1\n")],
                error: TransportError::Io("reset".to_string()),
            },
        );

        let body = transport
            .open(&StreamRequest::new("http://test/err"))
            .await
            .unwrap();
        let items = collect(body).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], Err(TransportError::Io("reset".to_string())));
    }

    #[tokio::test]
    async fn test_open_error_and_missing_response() {
        let transport = MockTransport::new();
        transport.set_response(
            "http://test/down",
            MockResponse::OpenError(TransportError::ConnectionFailed("refused".to_string())),
        );

        let result = transport.open(&StreamRequest::new("http://test/down")).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));

        let result = transport.open(&StreamRequest::new("http://other")).await;
        assert!(matches!(result, Err(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn test_feed_is_consumed_once() {
        let transport = MockTransport::new();
        let feed = transport.feed("http://test/live");

        let mut body = transport
            .open(&StreamRequest::new("http://test/live"))
            .await
            .unwrap();
        feed.send("data: x\n");
        assert_eq!(body.next().await, Some(Ok(Bytes::from("data: x\n"))));

        feed.close();
        assert_eq!(body.next().await, None);

        let again = transport.open(&StreamRequest::new("http://test/live")).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_feed_reports_cancellation() {
        let transport = MockTransport::new();
        let feed = transport.feed("http://test/live");
        let body = transport
            .open(&StreamRequest::new("http://test/live"))
            .await
            .unwrap();

        assert!(!feed.is_cancelled());
        drop(body);
        assert!(feed.is_cancelled());
    }

    #[tokio::test]
    async fn test_prefix_and_default_match() {
        let transport = MockTransport::new();
        transport.set_response("http://test/api", MockResponse::text(["a"]));
        transport.set_default_response(MockResponse::text(["b"]));

        let body = transport
            .open(&StreamRequest::new("http://test/api/v1/stream"))
            .await
            .unwrap();
        assert_eq!(collect(body).await, vec![Ok(Bytes::from("a"))]);

        let body = transport
            .open(&StreamRequest::new("http://elsewhere"))
            .await
            .unwrap();
        assert_eq!(collect(body).await, vec![Ok(Bytes::from("b"))]);
    }

    #[tokio::test]
    async fn test_requests_recorded() {
        let transport = MockTransport::new();
        transport.set_default_response(MockResponse::text(Vec::<String>::new()));

        transport
            .open(&StreamRequest::new("http://test/one"))
            .await
            .unwrap();

        let requests = transport.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://test/one");
        assert_eq!(requests[0].header("Accept"), Some("text/event-stream"));

        transport.clear_requests();
        assert!(transport.get_requests().is_empty());
    }
}
