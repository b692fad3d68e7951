//! Byte chunk to text increment decoding.
//!
//! Transports deliver raw byte chunks, and a chunk edge can fall inside a
//! multi-byte UTF-8 sequence. The decoder carries the incomplete tail over
//! to the next chunk so the text increments it produces never contain a
//! split code point.

use tracing::warn;

/// Incremental UTF-8 decoder.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    /// Bytes of an incomplete trailing sequence (at most 3)
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk.
    ///
    /// Invalid sequences are replaced with U+FFFD. An incomplete sequence at
    /// the end of the chunk is held back and completed by the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match err.error_len() {
                        None => {
                            self.pending = rest[valid..].to_vec();
                            break;
                        }
                        Some(len) => {
                            warn!("Received invalid UTF-8 in event stream");
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + len..];
                        }
                    }
                }
            }
        }
        out
    }

    /// Whether an incomplete sequence is being held.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush a held incomplete sequence as U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        warn!(
            bytes = self.pending.len(),
            "Event stream ended inside a UTF-8 sequence"
        );
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }

    /// Drop any held bytes.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
