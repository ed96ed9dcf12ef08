//! Protocol module - wire format, frame encoding, and frame decoding.
//!
//! This module implements the SSE text protocol:
//! - Event type and patch mode enumerations with their wire names
//! - [`Frame`] with a deterministic byte encoder
//! - [`FrameBuffer`] for decoding a byte stream back into frames

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::Frame;
pub use frame_buffer::{FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
pub use wire_format::{
    datalines, fields, is_default_retry, ElementPatchMode, EventType, UnknownVariant,
    AUTO_REMOVE_ATTRIBUTE, DATASTAR_KEY, DEFAULT_MAX_SIGNALS_SIZE, DEFAULT_RETRY_DURATION,
    SCRIPT_TARGET_SELECTOR,
};
