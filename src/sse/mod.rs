//! Line-oriented event-stream decoding.
//!
//! The wire format is a sequence of text lines terminated by `\n` or
//! `\r\n`:
//! - `data: <payload>` - a data payload
//! - `event: <name>` - an event name
//! - `data: [DONE]` - soft end-of-stream sentinel
//! - anything else, including blank lines - ignored
//!
//! # Module structure
//! - `line` - Classification of a single line (`SseLine`, `parse_sse_line`)
//! - `parser` - Accumulation buffer that turns text increments into lines (`SseParser`)
//! - `utf8` - Byte chunk to text increment decoding (`Utf8Decoder`)

mod line;
mod parser;
mod utf8;

pub use line::{parse_sse_line, SseLine, DATA_PREFIX, DONE_SENTINEL, EVENT_PREFIX};
pub use parser::SseParser;
pub use utf8::Utf8Decoder;
