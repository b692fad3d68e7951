//! Per-session pump task.
//!
//! Each call to `start_streaming` spawns one task that opens the transport
//! and reads the body. The task captured its generation at spawn time and
//! compares it with the streamer's current generation before touching
//! shared state, so a session that was aborted or superseded can never
//! leak lines into the next one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::completion::{Outcome, StreamEnd};
use super::metrics::Metrics;
use super::{StreamSignal, DATA, DEBUG, ERROR, EVENT};
use crate::bus::EventBus;
use crate::error::TransportError;
use crate::sse::{SseLine, SseParser, Utf8Decoder};
use crate::traits::{StreamRequest, Transport};

/// Why the streamer cancelled a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelReason {
    Abort,
    Supersede,
}

/// Handle to the running session, held by the streamer.
#[derive(Debug)]
pub(crate) struct ActiveHandle {
    pub(crate) generation: u64,
    pub(crate) cancel: oneshot::Sender<CancelReason>,
}

impl ActiveHandle {
    /// Ask the session task to stop. The task may already be gone.
    pub(crate) fn cancel(self, reason: CancelReason) {
        let _ = self.cancel.send(reason);
    }
}

/// State shared between the streamer and its session tasks.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) parser: SseParser,
    pub(crate) generation: u64,
    pub(crate) active: Option<ActiveHandle>,
    pub(crate) metrics: Metrics,
}

impl Shared {
    /// Release the active handle if it belongs to `generation`.
    fn release(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
        {
            self.active = None;
        }
        true
    }
}

pub(crate) fn lock(state: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Progress {
    Continue,
    Done,
}

/// One streaming session, tagged with its generation.
pub(crate) struct Session {
    pub(crate) generation: u64,
    pub(crate) state: Arc<Mutex<Shared>>,
    pub(crate) bus: EventBus<StreamSignal>,
    pub(crate) close_on_done: bool,
}

impl Session {
    /// Drive the session to its end and settle the completion.
    pub(crate) async fn run<T: Transport>(
        self,
        transport: Arc<T>,
        request: StreamRequest,
        mut cancel_rx: oneshot::Receiver<CancelReason>,
        done_tx: oneshot::Sender<Outcome>,
    ) {
        let outcome = self.drive(transport, request, &mut cancel_rx).await;
        match &outcome {
            Ok(end) => info!(generation = self.generation, end = end.as_str(), "Stream ended"),
            Err(err) => warn!(generation = self.generation, error = %err, "Stream failed"),
        }
        let _ = done_tx.send(outcome);
    }

    async fn drive<T: Transport>(
        &self,
        transport: Arc<T>,
        request: StreamRequest,
        cancel_rx: &mut oneshot::Receiver<CancelReason>,
    ) -> Outcome {
        let opened = tokio::select! {
            biased;
            reason = &mut *cancel_rx => return Ok(self.on_cancel(reason.ok())),
            opened = transport.open(&request) => opened,
        };
        let mut body = match opened {
            Ok(body) => body,
            Err(err) => return Err(self.on_error(err)),
        };

        let mut decoder = Utf8Decoder::new();
        loop {
            tokio::select! {
                biased;
                reason = &mut *cancel_rx => return Ok(self.on_cancel(reason.ok())),
                next = body.next() => match next {
                    Some(Ok(chunk)) => {
                        let text = decoder.decode(&chunk);
                        if let Progress::Done = self.on_progress(&text, true) {
                            return Ok(self.on_done(cancel_rx));
                        }
                    }
                    Some(Err(err)) => return Err(self.on_error(err)),
                    None => {
                        // Replacement text for a truncated code point was
                        // never delivered, so it is not counted.
                        let tail = decoder.finish();
                        if let Progress::Done = self.on_progress(&tail, false) {
                            return Ok(self.on_done(cancel_rx));
                        }
                        return Ok(self.on_complete(cancel_rx));
                    }
                },
            }
        }
    }

    /// New text arrived for this session. `counted` increments go into the
    /// traffic metrics.
    fn on_progress(&self, text: &str, counted: bool) -> Progress {
        if text.is_empty() {
            return Progress::Continue;
        }

        let lines = {
            let mut state = lock(&self.state);
            if state.generation != self.generation {
                return Progress::Continue;
            }
            if counted {
                state.metrics.record(text.chars().count());
            }
            state.parser.feed(text)
        };
        debug!(
            generation = self.generation,
            chars = text.chars().count(),
            lines = lines.len(),
            "Received chunk"
        );

        // Dispatch with the lock released so handlers may call back into
        // the streamer.
        for line in lines {
            match line {
                SseLine::Data(payload) => {
                    self.bus.publish(DATA, &StreamSignal::Data(payload));
                }
                SseLine::Event(name) => {
                    self.bus.publish(EVENT, &StreamSignal::Event(name));
                }
                SseLine::Done => {
                    debug!(generation = self.generation, "Received [DONE]");
                    if self.close_on_done {
                        return Progress::Done;
                    }
                }
                SseLine::Ignored => {}
            }
        }
        Progress::Continue
    }

    /// The sentinel ended the session.
    fn on_done(&self, cancel_rx: &mut oneshot::Receiver<CancelReason>) -> StreamEnd {
        if !lock(&self.state).release(self.generation) {
            return self.on_stale(cancel_rx);
        }
        self.debug("Stream done");
        StreamEnd::Done
    }

    /// The transport reached a clean end of stream.
    fn on_complete(&self, cancel_rx: &mut oneshot::Receiver<CancelReason>) -> StreamEnd {
        if !lock(&self.state).release(self.generation) {
            return self.on_stale(cancel_rx);
        }
        self.debug("Stream complete");
        StreamEnd::Complete
    }

    /// The transport failed. Surfaced even for a stale session.
    fn on_error(&self, err: TransportError) -> TransportError {
        lock(&self.state).release(self.generation);
        self.bus.publish(ERROR, &StreamSignal::Error(err.clone()));
        err
    }

    /// The streamer cancelled this session. A dropped sender counts as an
    /// abort.
    fn on_cancel(&self, reason: Option<CancelReason>) -> StreamEnd {
        match reason.unwrap_or(CancelReason::Abort) {
            CancelReason::Abort => {
                self.debug("Stream aborted");
                StreamEnd::Aborted
            }
            CancelReason::Supersede => {
                self.debug("Stream superseded");
                StreamEnd::Superseded
            }
        }
    }

    /// The session ended on its own after the streamer moved on.
    ///
    /// The streamer sends the cancel reason while holding the state lock,
    /// so once the generation has moved the reason is already waiting.
    fn on_stale(&self, cancel_rx: &mut oneshot::Receiver<CancelReason>) -> StreamEnd {
        match cancel_rx.try_recv() {
            Ok(reason) => self.on_cancel(Some(reason)),
            Err(_) => StreamEnd::Superseded,
        }
    }

    fn debug(&self, message: &str) {
        self.bus
            .publish(DEBUG, &StreamSignal::Debug(message.to_string()));
    }
}
