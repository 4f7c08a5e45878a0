//! Server-sent-events parsing for streamed chat completions.
//!
//! Network chunks do not respect event boundaries, so the accumulator keeps
//! a byte buffer and only parses lines once their terminating newline has
//! arrived. Lines that are not `data:` events, carry `[DONE]`, or fail to
//! parse are skipped.

use serde_json::Value;

/// One parsed piece of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of the answer itself.
    Content(String),
    /// A fragment of the model's reasoning trace, when the provider sends one.
    Reasoning(String),
    /// The stream finished.
    Done,
}

/// Reassembles SSE lines from raw network chunks.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    buffer: Vec<u8>,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the events from every line the
    /// chunk completed. A trailing partial line stays buffered until its
    /// newline arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Ok(line) = std::str::from_utf8(&line[..end]) {
                events.extend(parse_line(line.trim_end_matches('\r')));
            }
        }
        events
    }

    /// Flushes a final unterminated line after the stream ends.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        match std::str::from_utf8(&rest) {
            Ok(line) if !line.is_empty() => parse_line(line.trim_end_matches('\r')),
            _ => Vec::new(),
        }
    }
}

fn parse_line(line: &str) -> Vec<StreamEvent> {
    let Some(data) = line.strip_prefix("data: ") else {
        return Vec::new();
    };
    if data == "[DONE]" {
        return Vec::new();
    }
    let Ok(payload) = serde_json::from_str::<Value>(data) else {
        return Vec::new();
    };

    let delta = payload.pointer("/choices/0/delta");
    let mut events = Vec::new();
    if let Some(content) = delta.and_then(|delta| delta.get("content")).and_then(Value::as_str)
        && !content.is_empty()
    {
        events.push(StreamEvent::Content(content.to_string()));
    }
    if let Some(reasoning) = delta
        .and_then(|delta| delta.get("reasoning_content"))
        .and_then(Value::as_str)
        && !reasoning.is_empty()
    {
        events.push(StreamEvent::Reasoning(reasoning.to_string()));
    }
    events
}
