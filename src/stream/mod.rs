//! Stream module - the lifecycle of one SSE response.
//!
//! Provides:
//! - [`StreamBuilder`] - configures hooks and runs a stream over a sink
//! - [`ServerSentEventGenerator`] - issues intents bound to the sink
//! - [`StreamState`] - the open → closing → closed state machine
//!
//! # Example
//!
//! ```ignore
//! use datastar_sse::stream::StreamBuilder;
//!
//! let outcome = StreamBuilder::new()
//!     .on_abort(|| tracing::info!("client went away"))
//!     .run(sink, |sse| async move {
//!         sse.patch_elements(r#"<div id="status">Loading…</div>"#).await?;
//!         sse.patch_signals(&serde_json::json!({ "loading": false })).await
//!     })
//!     .await;
//! ```

mod generator;
mod lifecycle;

pub use generator::ServerSentEventGenerator;
pub use lifecycle::{AbortHook, ErrorHook, StreamBuilder, StreamOutcome};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Lifecycle state of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Sink accepts writes.
    Open,
    /// No new intents accepted; final flush in progress.
    Closing,
    /// Terminal.
    Closed,
}

impl StreamState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closing => 1,
            Self::Closed => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// State shared between the lifecycle runner and every generator clone.
pub(crate) struct Shared {
    state: AtomicU8,
    cancel: CancellationToken,
    on_abort: Mutex<Option<AbortHook>>,
}

impl Shared {
    pub(crate) fn new(cancel: CancellationToken, on_abort: Option<AbortHook>) -> Self {
        Self {
            state: AtomicU8::new(StreamState::Open.to_u8()),
            cancel,
            on_abort: Mutex::new(on_abort),
        }
    }

    pub(crate) fn state(&self) -> StreamState {
        StreamState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state() == StreamState::Open && !self.cancel.is_cancelled()
    }

    /// Move open → closing. Returns false if the stream already left `Open`.
    pub(crate) fn begin_closing(&self) -> bool {
        self.state
            .compare_exchange(
                StreamState::Open.to_u8(),
                StreamState::Closing.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_closed(&self) {
        self.state
            .store(StreamState::Closed.to_u8(), Ordering::Release);
    }

    /// Transport went away: move straight to closed and run the abort hook once.
    pub(crate) fn abort(&self) {
        let previous = self
            .state
            .swap(StreamState::Closed.to_u8(), Ordering::AcqRel);
        self.cancel.cancel();
        if StreamState::from_u8(previous) == StreamState::Closed {
            return;
        }

        tracing::debug!("Stream aborted by transport");
        let hook = self.on_abort.lock().ok().and_then(|mut hook| hook.take());
        if let Some(hook) = hook {
            hook();
        }
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
