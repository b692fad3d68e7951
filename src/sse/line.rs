//! Classification of a single event-stream line.

/// Prefix of a data line, including the separating space.
pub const DATA_PREFIX: &str = "data: ";

/// Prefix of an event-name line, including the separating space.
pub const EVENT_PREFIX: &str = "event: ";

/// Data payload that marks the soft end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const BOM: char = '\u{FEFF}';

/// A classified line from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `data: <payload>`
    Data(String),
    /// `event: <name>`
    Event(String),
    /// `data: [DONE]`
    Done,
    /// Blank or unrecognized line
    Ignored,
}

impl SseLine {
    /// Whether this line carries something to dispatch.
    pub fn is_dispatchable(&self) -> bool {
        !matches!(self, SseLine::Ignored)
    }
}

/// Classify one line (terminator already stripped).
///
/// Surrounding whitespace and byte order marks are trimmed before
/// matching, so the payload keeps any inner spacing but loses trailing
/// whitespace.
pub fn parse_sse_line(line: &str) -> SseLine {
    let trimmed = line.trim_matches(|c: char| c.is_whitespace() || c == BOM);
    if trimmed.is_empty() {
        return SseLine::Ignored;
    }

    if let Some(payload) = trimmed.strip_prefix(DATA_PREFIX) {
        if payload == DONE_SENTINEL {
            return SseLine::Done;
        }
        return SseLine::Data(payload.to_string());
    }

    if let Some(name) = trimmed.strip_prefix(EVENT_PREFIX) {
        return SseLine::Event(name.to_string());
    }

    SseLine::Ignored
}
