//! Incremental server-sent-events decoder.
//!
//! Bytes may arrive split anywhere, including inside a UTF-8 sequence; the
//! decoder buffers until a full line is available.
//!
//! ```rust
//! use pprovider::adapters::sse::SseDecoder;
//!
//! let mut decoder = SseDecoder::new();
//! assert!(decoder.push(b"event: ping\nda").expect("partial line").is_empty());
//!
//! let events = decoder.push(b"ta: {}\n\n").expect("complete event");
//! assert_eq!(events[0].event.as_deref(), Some("ping"));
//! assert_eq!(events[0].data, "{}");
//! ```

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            let line = std::str::from_utf8(&line)
                .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in event stream: {err}")))?;

            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Flushes a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Result<Option<SseEvent>, ProviderError> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8(rest)
                .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in event stream: {err}")))?;
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Ok(Some(event));
            }
        }

        Ok(self.dispatch())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }

        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SseDecoder;

    #[test]
    fn multibyte_characters_split_across_chunks_decode_intact() {
        let payload = "data: {\"text\":\"héllo\"}\n\n".as_bytes();
        let split = payload
            .iter()
            .position(|byte| *byte >= 0x80)
            .expect("payload should contain a multibyte character")
            + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&payload[..split]).expect("first half").is_empty());
        let events = decoder.push(&payload[split..]).expect("second half");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"text\":\"héllo\"}");
    }

    #[test]
    fn comments_crlf_and_multiline_data_are_handled() {
        let mut decoder = SseDecoder::new();
        let events = decoder
            .push(b": keep-alive\r\ndata: one\r\ndata: two\r\n\r\ndata: [DONE]\n\n")
            .expect("stream should decode");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "one\ntwo");
        assert_eq!(events[0].event, None);
        assert_eq!(events[1].data, "[DONE]");
    }

    #[test]
    fn finish_flushes_an_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").expect("partial").is_empty());

        let event = decoder
            .finish()
            .expect("finish should succeed")
            .expect("tail event should flush");
        assert_eq!(event.data, "tail");
        assert_eq!(decoder.finish().expect("second finish"), None);
    }
}
