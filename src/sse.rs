//! Incremental decoding and framing of the event-stream wire format.
//!
//! The server responds to a send-message call with a chunked body of
//! `event: <type>\ndata: <json>\n\n` blocks. Chunk boundaries are arbitrary:
//! they can fall mid-record and even mid-character, so decoding has to be
//! stateful in two layers. [`SseDecoder`] carries an undecoded byte tail (a
//! multi-byte UTF-8 sequence split across reads) and a rolling text buffer
//! (a record split across reads) between calls to [`SseDecoder::feed`].

use tracing::warn;

use crate::protocol::{EventKind, StreamEvent};

/// Stateful bytes-to-events decoder for one stream.
///
/// Feed it each network chunk as it arrives; it returns every event completed
/// by that chunk, in wire order. Bytes belonging to an unfinished character
/// or record are retained for the next call. A stream that ends mid-record
/// simply never yields that record; nothing is flushed at end-of-stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    partial: Vec<u8>,
    /// Decoded text not yet terminated by a record separator.
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk of bytes and return the events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_chunk(chunk);

        let mut events = Vec::new();
        while let Some(idx) = self.buffer.find("\n\n") {
            let record = self.buffer[..idx].to_string();
            self.buffer.drain(..idx + 2);
            if let Some(event) = parse_record(&record) {
                events.push(event);
            }
        }
        events
    }

    /// Append `chunk` to the text buffer, carrying partial UTF-8 sequences
    /// across calls and substituting U+FFFD for invalid bytes.
    fn decode_chunk(&mut self, chunk: &[u8]) {
        let mut bytes;
        let mut input: &[u8] = if self.partial.is_empty() {
            chunk
        } else {
            bytes = std::mem::take(&mut self.partial);
            bytes.extend_from_slice(chunk);
            &bytes
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    // The prefix is valid UTF-8, so lossy conversion borrows
                    // it without substitutions.
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&input[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push('\u{FFFD}');
                            input = &input[valid + invalid..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk;
                            // the rest of it arrives with the next read.
                            self.partial = input[valid..].to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Parse one complete record (the text between separators) into an event.
///
/// Returns `None` for records missing either field and for payloads that are
/// not valid JSON; a single bad record must not kill the stream.
fn parse_record(record: &str) -> Option<StreamEvent> {
    let mut event_type: Option<&str> = None;
    let mut data: Option<&str> = None;

    for line in record.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim());
        }
    }

    let (event_type, data) = match (event_type, data) {
        (Some(event_type), Some(data)) => (event_type, data),
        _ => return None,
    };

    match serde_json::from_str(data) {
        Ok(payload) => Some(StreamEvent {
            kind: EventKind::parse(event_type),
            data: payload,
        }),
        Err(err) => {
            warn!(event_type, error = %err, "dropping event record with malformed payload");
            None
        }
    }
}
