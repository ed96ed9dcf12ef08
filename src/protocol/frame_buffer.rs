//! Frame buffer for decoding an SSE byte stream back into frames.
//!
//! This is the client side of the wire format, used to verify what a
//! stream emitted and by tooling that consumes Datastar streams.
//! Implements a line-oriented state machine for handling fragmented input:
//! - complete lines (`\n` or `\r\n` terminated) update the pending frame
//! - a blank line dispatches the pending frame
//! - lines starting with `:` are comments and are ignored
//!
//! # Example
//!
//! ```
//! use datastar_sse::protocol::{EventType, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(b"event: datastar-remove-signals\ndata: pa").unwrap().is_empty());
//! let frames = buffer.push(b"ths user.name\n\n").unwrap();
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].event_type, EventType::RemoveSignals);
//! assert_eq!(frames[0].data_lines, ["paths user.name"]);
//! ```

use std::time::Duration;

use bytes::BytesMut;

use super::wire_format::{fields, EventType};
use super::Frame;
use crate::error::{DatastarError, Result};

/// Default maximum size of a single buffered frame (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Fields collected for the frame currently being decoded.
#[derive(Debug, Default)]
struct Pending {
    event: Option<String>,
    id: Option<String>,
    retry: Option<Duration>,
    data_lines: Vec<String>,
    size: usize,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.id.is_none() && self.retry.is_none() && self.data_lines.is_empty()
    }
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Bytes not yet forming a complete line.
    buffer: BytesMut,
    /// Frame being assembled from complete lines.
    pending: Pending,
    /// Maximum allowed size of one frame.
    max_frame_size: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new frame buffer with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            pending: Pending::default(),
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial lines and partially received frames are kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if a frame exceeds the maximum size, is not UTF-8,
    /// carries an unknown event type, or has a malformed `retry` value.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line = self.buffer.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }

            if let Some(frame) = self.process_line(&line)? {
                frames.push(frame);
            }
        }

        if self.pending.size + self.buffer.len() > self.max_frame_size {
            return Err(self.oversized());
        }

        Ok(frames)
    }

    fn process_line(&mut self, line: &[u8]) -> Result<Option<Frame>> {
        if line.is_empty() {
            return self.dispatch();
        }

        self.pending.size += line.len() + 1;
        if self.pending.size > self.max_frame_size {
            return Err(self.oversized());
        }

        let line = std::str::from_utf8(line)
            .map_err(|e| DatastarError::Protocol(format!("Frame is not valid UTF-8: {}", e)))?;
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            fields::EVENT => self.pending.event = Some(value.to_string()),
            fields::ID => self.pending.id = Some(value.to_string()),
            fields::RETRY => {
                let millis = value.parse::<u64>().map_err(|_| {
                    DatastarError::Protocol(format!("Invalid retry value: {}", value))
                })?;
                self.pending.retry = Some(Duration::from_millis(millis));
            }
            fields::DATA => self.pending.data_lines.push(value.to_string()),
            other => tracing::trace!("Ignoring unknown SSE field {}", other),
        }

        Ok(None)
    }

    fn dispatch(&mut self) -> Result<Option<Frame>> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(None);
        }

        let event = pending
            .event
            .ok_or_else(|| DatastarError::Protocol("Frame has no event type".to_string()))?;
        let event_type = event
            .parse::<EventType>()
            .map_err(|e| DatastarError::Protocol(e.to_string()))?;

        Ok(Some(Frame {
            event_type,
            id: pending.id,
            retry: pending.retry,
            data_lines: pending.data_lines,
        }))
    }

    fn oversized(&self) -> DatastarError {
        DatastarError::Protocol(format!(
            "Frame size exceeds maximum {}",
            self.max_frame_size
        ))
    }

    /// Get the number of buffered bytes not yet forming a complete line.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered, neither bytes nor a partial frame.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending = Pending::default();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
