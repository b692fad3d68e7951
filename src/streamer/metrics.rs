//! Per-streamer traffic counters.

use serde::{Deserialize, Serialize};

/// Counters for text increments received by current sessions.
///
/// Counters only grow. They are not reset between sessions; call
/// [`Streamer::reset_metrics`](crate::streamer::Streamer::reset_metrics)
/// for that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Number of non-empty increments received
    pub sse_chunks: u64,
    /// Total character count of those increments
    pub sse_bytes: u64,
}

impl Metrics {
    /// Account for one non-empty increment of `chars` characters.
    pub fn record(&mut self, chars: usize) {
        self.sse_chunks += 1;
        self.sse_bytes += chars as u64;
    }
}
