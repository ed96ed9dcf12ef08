//! Error types for datastar-sse.

use thiserror::Error;

/// Main error type for all outbound stream operations.
#[derive(Debug, Error)]
pub enum DatastarError {
    /// I/O error while writing to the sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (signals payload).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Signals must serialize to a JSON object.
    #[error("Signals must serialize to a JSON object, got {0}")]
    SignalsNotObject(&'static str),

    /// A single-line field (`id`, selector, path, ...) contains `\r` or `\n`.
    #[error("Field {0} must not contain a line break")]
    LineBreak(String),

    /// Signal removal without any path.
    #[error("Signal removal needs at least one path")]
    NoSignalPaths,

    /// Malformed inbound SSE frame.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Write attempted after the stream was closed or cancelled.
    #[error("Stream closed")]
    StreamClosed,

    /// Failure raised by a stream callback.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl DatastarError {
    /// Build a handler error from any displayable value.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }
}

/// Result type alias using DatastarError.
pub type Result<T> = std::result::Result<T, DatastarError>;

/// Reasons an inbound signals payload could not be read.
///
/// These are returned as values from [`read_signals`](crate::signals::read_signals),
/// never raised; the calling handler decides whether to ignore or reject.
#[derive(Debug, Error)]
pub enum ReadSignalsError {
    /// `GET` request without the `datastar` query parameter.
    #[error("No datastar object in request")]
    MissingParameter,

    /// Payload exceeds the configured maximum size.
    #[error("Request payload too large")]
    PayloadTooLarge,

    /// Body could not be read, or the payload is not valid JSON.
    #[error("Failed to parse signals: {0}")]
    Parse(String),

    /// Payload is valid JSON but not an object.
    #[error("Signals payload is not a JSON object")]
    NotAnObject,
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
