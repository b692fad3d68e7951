//! Result type alias for sse-tap operations.

use super::StreamError;

/// Type alias for Results of a streaming session.
///
/// # Example
///
/// ```ignore
/// use sse_tap::error::SseTapResult;
/// use sse_tap::streamer::StreamEnd;
///
/// async fn run(streamer: &Streamer<ReqwestTransport>) -> SseTapResult<StreamEnd> {
///     streamer.start_streaming("http://localhost:8000/stream").await
/// }
/// ```
pub type SseTapResult<T> = Result<T, StreamError>;
