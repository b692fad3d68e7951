//! Generation-gated event-stream sessions.
//!
//! A [`Streamer`] owns the accumulation buffer, the session generation
//! counter, the handle of the active session and the traffic metrics. It
//! opens sessions through a [`Transport`], decodes the body line by line
//! and publishes what it finds on an [`EventBus`]:
//!
//! | Channel | Payload |
//! |---------|---------|
//! | [`DATA`] | `data: <payload>` lines |
//! | [`EVENT`] | `event: <name>` lines |
//! | [`DEBUG`] | lifecycle notes ("Stream complete", "Stream aborted", ...) |
//! | [`ERROR`] | transport failures |
//!
//! Every start and every effective abort bumps the generation. Session
//! tasks compare their captured generation before touching the buffer, so
//! late chunks from a cancelled session are dropped silently.

mod completion;
mod metrics;
mod session;

pub use completion::{Completion, StreamEnd};
pub use metrics::Metrics;

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::info;

use crate::bus::{EventBus, Subscription};
use crate::config::StreamerConfig;
use crate::error::TransportError;
use crate::traits::{StreamRequest, Transport};
use session::{lock, ActiveHandle, CancelReason, Session, Shared};

/// Channel carrying data payloads.
pub const DATA: &str = "data";

/// Channel carrying event names.
pub const EVENT: &str = "event";

/// Channel carrying lifecycle diagnostics.
pub const DEBUG: &str = "debug";

/// Channel carrying transport failures.
pub const ERROR: &str = "error";

/// Payload published on the streamer's bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// Payload of a `data:` line
    Data(String),
    /// Name from an `event:` line
    Event(String),
    /// Lifecycle diagnostic
    Debug(String),
    /// Transport failure detail
    Error(TransportError),
}

impl StreamSignal {
    /// Channel this signal is published on.
    pub fn channel(&self) -> &'static str {
        match self {
            StreamSignal::Data(_) => DATA,
            StreamSignal::Event(_) => EVENT,
            StreamSignal::Debug(_) => DEBUG,
            StreamSignal::Error(_) => ERROR,
        }
    }

    /// Text carried by data, event and debug signals.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamSignal::Data(text) | StreamSignal::Event(text) | StreamSignal::Debug(text) => {
                Some(text)
            }
            StreamSignal::Error(_) => None,
        }
    }
}

/// Incremental event-stream reader with cancellable sessions.
///
/// # Example
///
/// ```ignore
/// use sse_tap::adapters::ReqwestTransport;
/// use sse_tap::streamer::Streamer;
///
/// let streamer = Streamer::new(ReqwestTransport::new());
/// streamer.on_data(|payload| println!("data: {}", payload));
/// streamer.on_event(|name| println!("event: {}", name));
///
/// let end = streamer.start_streaming("https://example.org/stream").await?;
/// println!("stream {}", end.as_str());
/// ```
pub struct Streamer<T: Transport> {
    transport: Arc<T>,
    config: StreamerConfig,
    bus: EventBus<StreamSignal>,
    state: Arc<Mutex<Shared>>,
}

impl<T: Transport> Streamer<T> {
    /// Create a streamer with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, StreamerConfig::default())
    }

    /// Create a streamer with the given configuration.
    pub fn with_config(transport: T, config: StreamerConfig) -> Self {
        Self::with_bus(transport, config, EventBus::new())
    }

    /// Create a streamer publishing on an existing bus.
    pub fn with_bus(transport: T, config: StreamerConfig, bus: EventBus<StreamSignal>) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
            bus,
            state: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Start a new session reading `url`.
    ///
    /// Bumps the generation and clears the buffer. A session that is still
    /// running is cancelled and its completion settles with
    /// [`StreamEnd::Superseded`].
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_streaming(&self, url: &str) -> Completion {
        let request = StreamRequest::new(url)
            .with_method(self.config.method)
            .with_headers(&self.config.headers);

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.parser.reset();
            let generation = state.generation;
            let previous = state.active.replace(ActiveHandle {
                generation,
                cancel: cancel_tx,
            });
            if let Some(previous) = previous {
                info!(
                    generation = previous.generation,
                    "Superseding active stream"
                );
                previous.cancel(CancelReason::Supersede);
            }
            generation
        };
        info!(generation, url, method = %request.method, "Starting stream");

        let session = Session {
            generation,
            state: Arc::clone(&self.state),
            bus: self.bus.clone(),
            close_on_done: self.config.close_on_done,
        };
        tokio::spawn(session.run(
            Arc::clone(&self.transport),
            request,
            cancel_rx,
            done_tx,
        ));

        Completion::new(generation, done_rx)
    }

    /// Start a session on the configured default URL.
    ///
    /// Returns `None` if the configuration has no URL.
    pub fn start_default(&self) -> Option<Completion> {
        let url = self.config.url.clone()?;
        Some(self.start_streaming(&url))
    }

    /// Cancel the active session.
    ///
    /// No-op without an active session. Otherwise the session's transport
    /// is cancelled, the handle cleared and the generation bumped, so any
    /// late callbacks of the session are ignored. The session's completion
    /// settles with [`StreamEnd::Aborted`]. Returns whether a session was
    /// cancelled.
    pub fn abort(&self) -> bool {
        let mut state = lock(&self.state);
        let Some(handle) = state.active.take() else {
            return false;
        };
        state.generation += 1;
        info!(
            generation = handle.generation,
            next = state.generation,
            "Aborting stream"
        );
        // Sent under the lock: a session that notices the generation moved
        // can rely on the reason being there.
        handle.cancel(CancelReason::Abort);
        true
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        lock(&self.state).generation
    }

    /// Whether a session handle is held.
    pub fn is_active(&self) -> bool {
        lock(&self.state).active.is_some()
    }

    /// Snapshot of the traffic counters.
    pub fn metrics(&self) -> Metrics {
        lock(&self.state).metrics
    }

    /// Zero the traffic counters.
    pub fn reset_metrics(&self) {
        lock(&self.state).metrics = Metrics::default();
    }

    /// Unterminated text currently buffered.
    pub fn buffered(&self) -> String {
        lock(&self.state).parser.buffered().to_string()
    }

    /// Configuration in use.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// The bus signals are published on.
    pub fn bus(&self) -> &EventBus<StreamSignal> {
        &self.bus
    }

    /// Subscribe to raw signals on `channel`.
    pub fn on<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(&StreamSignal) + Send + Sync + 'static,
    {
        self.bus.subscribe(channel, handler)
    }

    /// Subscribe to data payloads.
    pub fn on_data<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus.subscribe(DATA, move |signal| {
            if let StreamSignal::Data(payload) = signal {
                handler(payload);
            }
        })
    }

    /// Subscribe to event names.
    pub fn on_event<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus.subscribe(EVENT, move |signal| {
            if let StreamSignal::Event(name) = signal {
                handler(name);
            }
        })
    }

    /// Subscribe to lifecycle diagnostics.
    pub fn on_debug<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus.subscribe(DEBUG, move |signal| {
            if let StreamSignal::Debug(message) = signal {
                handler(message);
            }
        })
    }

    /// Subscribe to transport failures.
    pub fn on_error<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TransportError) + Send + Sync + 'static,
    {
        self.bus.subscribe(ERROR, move |signal| {
            if let StreamSignal::Error(err) = signal {
                handler(err);
            }
        })
    }
}

impl<T: Transport> std::fmt::Debug for Streamer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Streamer")
            .field("generation", &state.generation)
            .field("active", &state.active.is_some())
            .field("metrics", &state.metrics)
            .field("config", &self.config)
            .finish()
    }
}

/// Dropping the streamer aborts its running session.
impl<T: Transport> Drop for Streamer<T> {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockResponse, MockTransport};
    use crate::error::StreamError;
    use std::sync::Mutex as StdMutex;

    const URL: &str = "http://test/stream";

    /// Records every signal in publish order.
    fn record_all(streamer: &Streamer<MockTransport>) -> Arc<StdMutex<Vec<StreamSignal>>> {
        let log = Arc::new(StdMutex::new(Vec::new()));
        for channel in [DATA, EVENT, DEBUG, ERROR] {
            let sink = log.clone();
            streamer.on(channel, move |signal| sink.lock().unwrap().push(signal.clone()));
        }
        log
    }

    fn data(s: &str) -> StreamSignal {
        StreamSignal::Data(s.to_string())
    }

    fn debug(s: &str) -> StreamSignal {
        StreamSignal::Debug(s.to_string())
    }

    #[test]
    fn test_signal_channel_and_text() {
        assert_eq!(data("x").channel(), DATA);
        assert_eq!(StreamSignal::Event("e".to_string()).channel(), EVENT);
        assert_eq!(debug("d").channel(), DEBUG);
        let err = StreamSignal::Error(TransportError::Io("x".to_string()));
        assert_eq!(err.channel(), ERROR);
        assert_eq!(data("x").as_text(), Some("x"));
        assert_eq!(err.as_text(), None);
    }

    #[test]
    fn test_abort_without_session_is_noop() {
        let streamer = Streamer::new(MockTransport::new());
        assert!(!streamer.abort());
        assert_eq!(streamer.generation(), 0);
    }

    #[tokio::test]
    async fn test_split_line_is_joined() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::text(["data: hel", "lo\n"]));
        let streamer = Streamer::new(transport);
        let log = record_all(&streamer);

        let end = streamer.start_streaming(URL).await;
        assert_eq!(end, Ok(StreamEnd::Complete));
        assert_eq!(
            *log.lock().unwrap(),
            vec![data("hello"), debug("Stream complete")]
        );
        assert!(!streamer.is_active());
    }

    #[tokio::test]
    async fn test_metrics_count_increments() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::text(["data: hel", "lo\n"]));
        let streamer = Streamer::new(transport);

        streamer.start_streaming(URL).await.unwrap();
        assert_eq!(
            streamer.metrics(),
            Metrics {
                sse_chunks: 2,
                sse_bytes: 12
            }
        );

        streamer.reset_metrics();
        assert_eq!(streamer.metrics(), Metrics::default());
    }

    #[tokio::test]
    async fn test_metrics_count_characters() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::text(["data: é✓\n"]));
        let streamer = Streamer::new(transport);

        streamer.start_streaming(URL).await.unwrap();
        assert_eq!(
            streamer.metrics(),
            Metrics {
                sse_chunks: 1,
                sse_bytes: 9
            }
        );
    }

    #[tokio::test]
    async fn test_truncated_tail_not_counted() {
        let transport = MockTransport::new();
        transport.set_response(
            URL,
            MockResponse::Stream(vec![
                bytes::Bytes::from("data: x\n"),
                bytes::Bytes::from_static(&[0xE2, 0x9C]),
            ]),
        );
        let streamer = Streamer::new(transport);
        let log = record_all(&streamer);

        assert_eq!(streamer.start_streaming(URL).await, Ok(StreamEnd::Complete));
        assert_eq!(
            streamer.metrics(),
            Metrics {
                sse_chunks: 1,
                sse_bytes: 8
            }
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec![data("x"), debug("Stream complete")]
        );
    }

    #[tokio::test]
    async fn test_request_carries_stream_headers() {
        let transport = MockTransport::new();
        transport.set_default_response(MockResponse::text(Vec::<String>::new()));
        let config = StreamerConfig::default().with_header("Authorization", "Bearer t");
        let streamer = Streamer::with_config(transport.clone(), config);

        streamer.start_streaming(URL).await.unwrap();
        let requests = transport.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Accept"), Some("text/event-stream"));
        assert_eq!(requests[0].header("Cache-Control"), Some("no-cache"));
        assert_eq!(requests[0].header("Authorization"), Some("Bearer t"));
    }

    #[tokio::test]
    async fn test_done_closes_session_by_default() {
        let transport = MockTransport::new();
        transport.set_response(
            URL,
            MockResponse::hanging(["data: [DONE]\ndata: after\n"]),
        );
        let streamer = Streamer::new(transport);
        let log = record_all(&streamer);

        assert_eq!(streamer.start_streaming(URL).await, Ok(StreamEnd::Done));
        assert_eq!(*log.lock().unwrap(), vec![debug("Stream done")]);
        assert!(!streamer.is_active());
        assert_eq!(streamer.generation(), 1);
    }

    #[tokio::test]
    async fn test_done_only_stops_pass_when_kept_open() {
        let transport = MockTransport::new();
        transport.set_response(
            URL,
            MockResponse::text(["data: [DONE]\ndata: after\n", "data: later\n"]),
        );
        let config = StreamerConfig::default().with_close_on_done(false);
        let streamer = Streamer::with_config(transport, config);
        let log = record_all(&streamer);

        assert_eq!(streamer.start_streaming(URL).await, Ok(StreamEnd::Complete));
        assert_eq!(
            *log.lock().unwrap(),
            vec![data("later"), debug("Stream complete")]
        );
    }

    #[tokio::test]
    async fn test_abort_before_any_increment() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::hanging(Vec::<String>::new()));
        let streamer = Streamer::new(transport);
        let log = record_all(&streamer);

        let completion = streamer.start_streaming(URL);
        assert!(streamer.abort());
        assert!(!streamer.abort());

        assert_eq!(completion.await, Ok(StreamEnd::Aborted));
        assert_eq!(*log.lock().unwrap(), vec![debug("Stream aborted")]);
        assert_eq!(streamer.generation(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_rejects_completion() {
        let transport = MockTransport::new();
        transport.set_response(
            URL,
            MockResponse::OpenError(TransportError::ServerError {
                status: 503,
                message: "busy".to_string(),
            }),
        );
        let streamer = Streamer::new(transport);
        let errors = Arc::new(StdMutex::new(Vec::new()));
        let sink = errors.clone();
        streamer.on_error(move |err| sink.lock().unwrap().push(err.clone()));

        let result = streamer.start_streaming(URL).await;
        let expected = TransportError::ServerError {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(result, Err(StreamError::Transport(expected.clone())));
        assert_eq!(*errors.lock().unwrap(), vec![expected]);
        assert!(!streamer.is_active());
    }

    #[tokio::test]
    async fn test_typed_helpers_filter_channels() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::text(["event: tick\ndata: 1\n"]));
        let streamer = Streamer::new(transport);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        streamer.on_event(move |name| sink.lock().unwrap().push(format!("event:{}", name)));
        let sink = seen.clone();
        streamer.on_data(move |payload| sink.lock().unwrap().push(format!("data:{}", payload)));
        let sink = seen.clone();
        streamer.on_debug(move |msg| sink.lock().unwrap().push(format!("debug:{}", msg)));

        streamer.start_streaming(URL).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["event:tick", "data:1", "debug:Stream complete"]
        );
    }

    #[tokio::test]
    async fn test_start_default_uses_config_url() {
        let transport = MockTransport::new();
        transport.set_response(URL, MockResponse::text(["data: x\n"]));
        let streamer = Streamer::with_config(
            transport.clone(),
            StreamerConfig::default().with_url(URL),
        );
        let completion = streamer.start_default().unwrap();
        assert_eq!(completion.await, Ok(StreamEnd::Complete));

        let bare = Streamer::new(transport);
        assert!(bare.start_default().is_none());
    }
}
