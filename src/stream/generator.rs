//! Generator handle for issuing intents on a stream.
//!
//! Provides one method per protocol operation:
//! - `patch_signals` - merge a JSON object into client signals
//! - `patch_elements` - patch markup into the document
//! - `remove_fragments` - remove elements by selector
//! - `remove_signals` - remove signals by path
//! - `execute_script` - run a script (sent as an element patch)
//!
//! Fully configured intents go through [`ServerSentEventGenerator::send`].
//!
//! # Example
//!
//! ```ignore
//! async fn tick(sse: ServerSentEventGenerator) -> Result<()> {
//!     sse.send(PatchElements::new("<li>tick</li>").selector("#log").mode(ElementPatchMode::Append))
//!         .await?;
//!     sse.remove_signals(["pending"]).await
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{Shared, StreamState};
use crate::error::{DatastarError, Result};
use crate::events::{ExecuteScript, PatchElements, PatchSignals, RemoveFragments, RemoveSignals};
use crate::protocol::Frame;
use crate::writer::WriterHandle;

/// Issues intents on one stream.
///
/// `Clone` so it can be moved into spawned tasks; every clone writes to the
/// same ordered sink. Await each call before issuing the next one from the
/// same task.
#[derive(Clone)]
pub struct ServerSentEventGenerator {
    writer: WriterHandle,
    shared: Arc<Shared>,
}

impl ServerSentEventGenerator {
    pub(crate) fn new(writer: WriterHandle, shared: Arc<Shared>) -> Self {
        Self { writer, shared }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    /// Check if intents are still accepted.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Token cancelled when the stream is aborted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancellation_token().clone()
    }

    /// Encode and write a frame, waiting until it reaches the sink.
    ///
    /// # Errors
    ///
    /// Returns `StreamClosed` if the stream is no longer open, `LineBreak`
    /// if a single-line field spans several lines, and `Io` if the write
    /// failed. A failed write aborts the stream, and so does the first write
    /// attempted after cancellation.
    pub async fn send(&self, event: impl Into<Frame>) -> Result<()> {
        if !self.is_open() {
            if self.shared.cancellation_token().is_cancelled() {
                self.shared.abort();
            }
            return Err(DatastarError::StreamClosed);
        }

        let frame = event.into();
        frame.validate()?;
        tracing::trace!("Sending {} frame", frame.event_type);

        match self.writer.send(frame.encode()).await {
            Err(DatastarError::Io(e)) => {
                tracing::debug!("Write failed, aborting stream: {}", e);
                self.shared.abort();
                Err(DatastarError::Io(e))
            }
            other => other,
        }
    }

    /// Patch client signals with a serializable JSON object.
    pub async fn patch_signals<T: Serialize + ?Sized>(&self, signals: &T) -> Result<()> {
        self.send(PatchSignals::new(signals)?).await
    }

    /// Patch client signals only where they do not exist yet.
    pub async fn patch_signals_if_missing<T: Serialize + ?Sized>(&self, signals: &T) -> Result<()> {
        self.send(PatchSignals::new(signals)?.only_if_missing(true))
            .await
    }

    /// Patch elements in the default (`outer`) mode.
    pub async fn patch_elements(&self, elements: impl Into<String>) -> Result<()> {
        self.send(PatchElements::new(elements)).await
    }

    /// Remove the elements matching `selector`.
    pub async fn remove_fragments(&self, selector: impl Into<String>) -> Result<()> {
        self.send(RemoveFragments::new(selector)).await
    }

    /// Remove signals by path.
    pub async fn remove_signals<I, P>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.send(RemoveSignals::new(paths)?).await
    }

    /// Run a script on the client; the element removes itself afterwards.
    pub async fn execute_script(&self, script: impl Into<String>) -> Result<()> {
        self.send(ExecuteScript::new(script)).await
    }
}
