//! Accumulation buffer for text increments.
//!
//! Increments arrive with arbitrary alignment: one may end in the middle of
//! a line, a field name or a `\r\n` pair. The parser keeps the unterminated
//! suffix between calls and only classifies lines once their terminator has
//! been seen.

use super::line::{parse_sse_line, SseLine};

/// Stateful line splitter for one streaming session.
///
/// After every [`feed`](SseParser::feed) the buffer holds exactly the text
/// received since the last line terminator.
#[derive(Debug, Default, Clone)]
pub struct SseParser {
    /// Text received but not yet terminated
    buffer: String,
}

impl SseParser {
    /// Create a parser with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an increment and return the dispatchable lines it completed.
    ///
    /// Lines come back in stream order. Blank and unrecognized lines are
    /// dropped. If a `data: [DONE]` line is reached the returned vector ends
    /// with [`SseLine::Done`] and any later lines completed by this increment
    /// are discarded; the buffered remainder is kept.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseLine> {
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);

        let mut lines = Vec::new();
        // `lines()` accepts both `\n` and `\r\n` as terminators.
        for raw in complete.lines() {
            match parse_sse_line(raw) {
                SseLine::Ignored => continue,
                SseLine::Done => {
                    lines.push(SseLine::Done);
                    break;
                }
                line => lines.push(line),
            }
        }
        lines
    }

    /// The unterminated text currently held.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop any buffered text.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
