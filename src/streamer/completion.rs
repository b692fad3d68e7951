//! Completion signal of a streaming session.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{SseTapResult, StreamError, TransportError};

/// How a session ended without a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the stream.
    Complete,
    /// A `data: [DONE]` line ended the session.
    Done,
    /// [`Streamer::abort`](crate::streamer::Streamer::abort) cancelled the session.
    Aborted,
    /// A newer session replaced this one.
    Superseded,
}

impl StreamEnd {
    /// Short description for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEnd::Complete => "complete",
            StreamEnd::Done => "done",
            StreamEnd::Aborted => "aborted",
            StreamEnd::Superseded => "superseded",
        }
    }
}

pub(crate) type Outcome = Result<StreamEnd, TransportError>;

/// Future that settles once when its session ends.
///
/// Resolves to `Ok(StreamEnd)` on clean end, sentinel, abort or
/// supersession, and to `Err` on transport failure. If the session task
/// dies before settling (for instance a subscriber panicked) it resolves to
/// [`StreamError::Interrupted`].
///
/// Dropping a `Completion` does not cancel the session.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    rx: oneshot::Receiver<Outcome>,
}

impl Completion {
    pub(crate) fn new(generation: u64, rx: oneshot::Receiver<Outcome>) -> Self {
        Self { generation, rx }
    }

    /// Generation of the session this completion belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Future for Completion {
    type Output = SseTapResult<StreamEnd>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(Ok(end)) => Ok(end),
            Ok(Err(err)) => Err(StreamError::Transport(err)),
            Err(_) => Err(StreamError::Interrupted),
        })
    }
}
