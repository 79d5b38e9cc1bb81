//! Incremental decoder for streamed chat-completion responses.
//!
//! The chat function relays the upstream `text/event-stream` untouched, so
//! the consumer sees OpenAI-style frames:
//!
//! ```text
//! : keep-alive comment
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Network chunks may split a frame (or a multi-byte character) anywhere.
//! [`DeltaDecoder`] buffers the incomplete tail and yields each frame's
//! `choices[0].delta.content` once its line is complete.

use serde_json::Value;
use tracing::debug;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Stateful line decoder fed with raw body chunks.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    /// Bytes of a UTF-8 sequence cut off at the end of the last chunk.
    utf8_tail: Vec<u8>,
    /// Decoded text not yet terminated by `\n`.
    buffer: String,
    done: bool,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once `data: [DONE]` has been seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one body chunk; returns the content deltas completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.append_utf8(chunk);

        while !self.done {
            let Some(idx) = self.buffer.find('\n') else {
                break;
            };
            let line: String = self.buffer.drain(..=idx).collect();
            self.handle_line(&line[..line.len() - 1], &mut out);
        }
        out
    }

    /// Flush at end of stream: a final line without a trailing newline is
    /// still decoded.
    pub fn finish(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let rest = std::mem::take(&mut self.buffer);
        for line in rest.split('\n') {
            if self.done {
                break;
            }
            self.handle_line(line, &mut out);
        }
        out
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<String>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') || line.trim().is_empty() {
            return;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.trim();
        if payload == DONE_MARKER {
            self.done = true;
            return;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(frame) => {
                if let Some(content) = frame
                    .pointer("/choices/0/delta/content")
                    .and_then(Value::as_str)
                    .filter(|c| !c.is_empty())
                {
                    out.push(content.to_owned());
                }
            }
            Err(e) => debug!(error = %e, "skipping malformed stream frame"),
        }
    }

    /// Decode `chunk` onto `buffer`, holding back an incomplete trailing
    /// sequence. Invalid bytes become U+FFFD.
    fn append_utf8(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            self.utf8_tail = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}
