//! Frame struct and SSE encoder.
//!
//! A [`Frame`] is one complete SSE message: event type, optional id,
//! optional retry, and an ordered list of data lines. Encoding is pure and
//! deterministic; the same frame always yields the same bytes.
//!
//! # Example
//!
//! ```
//! use datastar_sse::protocol::{EventType, Frame};
//!
//! let frame = Frame::new(EventType::PatchSignals).data("signals", r#"{"count":1}"#);
//!
//! assert_eq!(
//!     &frame.encode()[..],
//!     b"event: datastar-patch-signals\ndata: signals {\"count\":1}\n\n"
//! );
//! ```

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{datalines, fields, is_default_retry, EventType};
use crate::error::{DatastarError, Result};

/// A complete Datastar SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Event type written on the `event:` line.
    pub event_type: EventType,
    /// Optional event id (`id:` line).
    pub id: Option<String>,
    /// Optional reconnect delay (`retry:` line, omitted when default).
    pub retry: Option<Duration>,
    /// Data lines, each written as `data: <line>` in order.
    pub data_lines: Vec<String>,
}

impl Frame {
    /// Create an empty frame of the given event type.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            id: None,
            retry: None,
            data_lines: Vec::new(),
        }
    }

    /// Set the event id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the retry duration.
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Append a `<prefix> <value>` data line.
    pub fn data(mut self, prefix: &str, value: impl AsRef<str>) -> Self {
        self.push_data(prefix, value);
        self
    }

    /// Append a `<prefix> <value>` data line in place.
    pub fn push_data(&mut self, prefix: &str, value: impl AsRef<str>) {
        self.data_lines.push(format!("{} {}", prefix, value.as_ref()));
    }

    /// Append one `<prefix> <line>` data line per line of `value`.
    ///
    /// Splits on `\r\n`, `\n` and a lone `\r`, the line endings an SSE
    /// client recognizes. An empty `value` adds nothing.
    pub fn push_multiline(&mut self, prefix: &str, value: &str) {
        for line in split_lines(value) {
            self.push_data(prefix, line);
        }
    }

    /// Check that every field fits on a single wire line.
    ///
    /// # Errors
    ///
    /// Returns `LineBreak` naming the first field (`id` or a data-line
    /// prefix) that contains `\r` or `\n`.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_deref().is_some_and(has_line_break) {
            return Err(DatastarError::LineBreak(fields::ID.to_string()));
        }
        if let Some(line) = self.data_lines.iter().find(|line| has_line_break(line)) {
            let field = line.split_once(' ').map_or(line.as_str(), |(prefix, _)| prefix);
            return Err(DatastarError::LineBreak(field.to_string()));
        }
        Ok(())
    }

    /// Iterate the values of every data line carrying `prefix`.
    pub fn values<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.data_lines.iter().filter_map(move |line| {
            line.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(' ').or(rest.is_empty().then_some(rest)))
        })
    }

    /// Recover the signals JSON carried by a patch-signals frame.
    ///
    /// Returns `None` for any other event type.
    pub fn signals(&self) -> Option<serde_json::Result<serde_json::Value>> {
        if self.event_type != EventType::PatchSignals {
            return None;
        }
        let json = self.values(datalines::SIGNALS).collect::<Vec<_>>().join("\n");
        Some(serde_json::from_str(&json))
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        let mut len = fields::EVENT.len() + 2 + self.event_type.as_str().len() + 1;
        if let Some(id) = &self.id {
            len += fields::ID.len() + 2 + id.len() + 1;
        }
        if let Some(retry) = self.wire_retry() {
            len += fields::RETRY.len() + 2 + retry.as_millis().to_string().len() + 1;
        }
        for line in &self.data_lines {
            len += fields::DATA.len() + 2 + line.len() + 1;
        }
        len + 1
    }

    /// Encode the frame to bytes.
    ///
    /// Encoding does not check fields; see [`Frame::validate`].
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Encode the frame into an existing buffer.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        put_field(buf, fields::EVENT, self.event_type.as_str());
        if let Some(id) = &self.id {
            put_field(buf, fields::ID, id);
        }
        if let Some(retry) = self.wire_retry() {
            put_field(buf, fields::RETRY, &retry.as_millis().to_string());
        }
        for line in &self.data_lines {
            put_field(buf, fields::DATA, line);
        }
        buf.put_u8(b'\n');
    }

    fn wire_retry(&self) -> Option<Duration> {
        self.retry.filter(|retry| !is_default_retry(*retry))
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Split on every SSE line ending, dropping one trailing terminator.
fn split_lines(value: &str) -> impl Iterator<Item = &str> {
    let body = value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .or_else(|| value.strip_suffix('\r'))
        .unwrap_or(value);

    (!value.is_empty())
        .then(|| body.split("\r\n").flat_map(|part| part.split(['\r', '\n'])))
        .into_iter()
        .flatten()
}

fn put_field(buf: &mut BytesMut, field: &str, value: &str) {
    buf.put_slice(field.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_u8(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(frame: &Frame) -> String {
        String::from_utf8(frame.encode().to_vec()).unwrap()
    }

    #[test]
    fn test_minimal_frame() {
        let frame = Frame::new(EventType::PatchSignals).data("signals", "{}");
        assert_eq!(
            text(&frame),
            "event: datastar-patch-signals\ndata: signals {}\n\n"
        );
    }

    #[test]
    fn test_line_order() {
        let frame = Frame::new(EventType::PatchElements)
            .retry(Duration::from_secs(3))
            .id("evt-1")
            .data("mode", "append")
            .data("selector", "body")
            .data("elements", "<div>x</div>");

        assert_eq!(
            text(&frame),
            "event: datastar-patch-elements\n\
             id: evt-1\n\
             retry: 3000\n\
             data: mode append\n\
             data: selector body\n\
             data: elements <div>x</div>\n\n"
        );
    }

    #[test]
    fn test_default_retry_omitted() {
        let frame = Frame::new(EventType::RemoveSignals)
            .retry(Duration::from_millis(1000))
            .data("paths", "a");
        assert!(!text(&frame).contains("retry:"));

        let frame = frame.retry(Duration::from_millis(1001));
        assert!(text(&frame).contains("retry: 1001\n"));
    }

    #[test]
    fn test_single_terminator() {
        let frame = Frame::new(EventType::PatchElements)
            .data("elements", "<p>a</p>")
            .data("elements", "<p>b</p>");
        let out = text(&frame);

        assert!(out.ends_with("\n\n"));
        assert!(!out.ends_with("\n\n\n"));
        assert_eq!(out.matches("\n\n").count(), 1);
    }

    #[test]
    fn test_push_multiline() {
        let mut frame = Frame::new(EventType::PatchElements);
        frame.push_multiline("elements", "<ul>\n<li>1</li>\r\n</ul>");
        assert_eq!(
            frame.data_lines,
            vec!["elements <ul>", "elements <li>1</li>", "elements </ul>"]
        );

        let mut empty = Frame::new(EventType::PatchElements);
        empty.push_multiline("elements", "");
        assert!(empty.data_lines.is_empty());
    }

    #[test]
    fn test_push_multiline_lone_carriage_return() {
        let mut frame = Frame::new(EventType::PatchElements);
        frame.push_multiline("elements", "<p>a\rb</p>\r\n<p>c</p>\n");
        assert_eq!(
            frame.data_lines,
            vec!["elements <p>a", "elements b</p>", "elements <p>c</p>"]
        );
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_line_break_in_id() {
        let frame = Frame::new(EventType::PatchSignals)
            .id("1\n\n")
            .data("signals", "{}");
        let err = frame.validate().unwrap_err();
        assert!(matches!(err, DatastarError::LineBreak(ref field) if field == "id"));

        let frame = Frame::new(EventType::PatchSignals).id("1\r").data("signals", "{}");
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_validate_names_data_field() {
        let frame = Frame::new(EventType::RemoveFragments).data("selector", "#a\n\nevent: x");
        let err = frame.validate().unwrap_err();
        assert!(matches!(err, DatastarError::LineBreak(ref field) if field == "selector"));
    }

    #[test]
    fn test_encoded_len_matches() {
        let frame = Frame::new(EventType::PatchSignals)
            .id("7")
            .retry(Duration::from_millis(250))
            .data("onlyIfMissing", "true")
            .data("signals", r#"{"a":1}"#);
        assert_eq!(frame.encoded_len(), frame.encode().len());
    }

    #[test]
    fn test_encode_is_idempotent() {
        let frame = Frame::new(EventType::PatchSignals).data("signals", r#"{"x":[1,2]}"#);
        assert_eq!(frame.encode(), frame.encode());
    }

    #[test]
    fn test_values_and_signals() {
        let frame = Frame::new(EventType::PatchSignals)
            .data("onlyIfMissing", "true")
            .data("signals", r#"{"shape":"heart"}"#);

        assert_eq!(frame.values("onlyIfMissing").collect::<Vec<_>>(), ["true"]);
        let signals = frame.signals().unwrap().unwrap();
        assert_eq!(signals, serde_json::json!({ "shape": "heart" }));

        let other = Frame::new(EventType::RemoveSignals).data("paths", "x");
        assert!(other.signals().is_none());
    }

    #[test]
    fn test_values_ignores_longer_prefix() {
        let frame = Frame::new(EventType::PatchSignals).data("signalsX", "nope");
        assert_eq!(frame.values("signals").count(), 0);
    }
}
