//! Common test utilities for integration tests.
//!
//! Provides a signal recorder that subscribes to every streamer channel
//! and a polling helper for waiting on asynchronous session progress.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sse_tap::streamer::{StreamSignal, Streamer, DATA, DEBUG, ERROR, EVENT};
use sse_tap::traits::Transport;

/// Records every signal published by a streamer, in publish order.
#[derive(Clone, Default)]
pub struct SignalLog {
    signals: Arc<Mutex<Vec<StreamSignal>>>,
}

impl SignalLog {
    /// Subscribe a recorder to all four channels of `streamer`.
    pub fn attach<T: Transport>(streamer: &Streamer<T>) -> Self {
        let log = Self::default();
        for channel in [DATA, EVENT, DEBUG, ERROR] {
            let sink = log.signals.clone();
            streamer.on(channel, move |signal| sink.lock().unwrap().push(signal.clone()));
        }
        log
    }

    /// Copy of everything recorded so far.
    pub fn all(&self) -> Vec<StreamSignal> {
        self.signals.lock().unwrap().clone()
    }

    /// Number of signals recorded so far.
    pub fn len(&self) -> usize {
        self.signals.lock().unwrap().len()
    }

    /// Payloads of recorded data signals.
    pub fn data(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|signal| match signal {
                StreamSignal::Data(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Messages of recorded debug signals.
    pub fn debug(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|signal| match signal {
                StreamSignal::Debug(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

/// Shorthand for a data signal.
pub fn data(payload: &str) -> StreamSignal {
    StreamSignal::Data(payload.to_string())
}

/// Shorthand for an event signal.
pub fn event(name: &str) -> StreamSignal {
    StreamSignal::Event(name.to_string())
}

/// Shorthand for a debug signal.
pub fn debug(message: &str) -> StreamSignal {
    StreamSignal::Debug(message.to_string())
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
