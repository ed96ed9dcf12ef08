//! Stream builder and lifecycle runner.
//!
//! The [`StreamBuilder`] provides a fluent API for configuring hooks and
//! options. [`StreamBuilder::run`] manages the lifecycle:
//! 1. Spawn the writer task that owns the sink
//! 2. Hand a [`ServerSentEventGenerator`] to the caller's callback
//! 3. On completion, close the sink (unless `keep_open`)
//! 4. On callback error, run `on_error`, then close
//! 5. On cancellation or a dead transport, run `on_abort` and stop writing
//!
//! Cancellation never interrupts the callback. It is observed at the next
//! write, which fails with `StreamClosed`, or at teardown.
//!
//! ```text
//!            callback Ok / Err            flush + shutdown
//!   Open ──────────────────────► Closing ─────────────────► Closed
//!     │                                                       ▲
//!     └────────── cancel token / failed write ────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{ServerSentEventGenerator, Shared, StreamState};
use crate::error::{DatastarError, Result};
use crate::writer::{spawn_writer_task, WriterConfig, WriterHandle};

/// Called with the callback's error before the stream is closed.
pub type ErrorHook = Box<dyn FnOnce(&DatastarError) + Send>;

/// Called once when the transport goes away.
pub type AbortHook = Box<dyn FnOnce() + Send>;

/// How a stream ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// Callback finished and the sink was closed.
    Closed,
    /// Callback failed; `on_error` ran and the sink was closed.
    Failed(DatastarError),
    /// Cancelled or disconnected; `on_abort` ran.
    Aborted,
}

impl StreamOutcome {
    /// Check if the stream ended without error or abort.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Builder for configuring and running one SSE stream.
pub struct StreamBuilder {
    keep_open: bool,
    writer_config: WriterConfig,
    on_error: Option<ErrorHook>,
    on_abort: Option<AbortHook>,
    cancel: CancellationToken,
}

impl StreamBuilder {
    /// Create a new stream builder.
    pub fn new() -> Self {
        Self {
            keep_open: false,
            writer_config: WriterConfig::default(),
            on_error: None,
            on_abort: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Keep the sink open after the callback returns.
    ///
    /// The stream then stays open until it is cancelled or every generator
    /// clone has been dropped.
    /// Default: false
    pub fn keep_open(mut self, keep_open: bool) -> Self {
        self.keep_open = keep_open;
        self
    }

    /// Set the hook called when the callback returns an error.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&DatastarError) + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Set the hook called when the stream is aborted.
    pub fn on_abort<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_abort = Some(Box::new(hook));
        self
    }

    /// Use an external token to cancel the stream.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set the writer channel capacity.
    ///
    /// Default: 64
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.writer_config.channel_capacity = capacity;
        self
    }

    /// Run the stream over `sink`.
    ///
    /// The callback receives a generator bound to the sink. Errors are
    /// reported through the hooks and the returned [`StreamOutcome`].
    pub async fn run<W, F, Fut>(self, sink: W, callback: F) -> StreamOutcome
    where
        W: AsyncWrite + Unpin + Send + 'static,
        F: FnOnce(ServerSentEventGenerator) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let (writer, writer_task) = spawn_writer_task(sink, self.writer_config);
        let shared = Arc::new(Shared::new(self.cancel.clone(), self.on_abort));
        let generator = ServerSentEventGenerator::new(writer.clone(), shared.clone());

        tracing::debug!("Stream opened");

        // Cancellation is cooperative: the callback always runs to completion
        // and sees it through `is_open` and failed sends.
        let result = callback(generator).await;

        if shared.cancellation_token().is_cancelled() {
            if let Err(e) = &result {
                tracing::debug!("Callback error after cancellation: {}", e);
            }
            return abort(&shared, writer_task);
        }

        if shared.state() == StreamState::Closed {
            // A write failed inside the callback; the abort already ran.
            writer_task.abort();
            return StreamOutcome::Aborted;
        }

        match result {
            Ok(()) if self.keep_open => {
                drop(writer);
                wait_until_released(&shared, writer_task).await
            }
            Ok(()) => match close(&shared, &writer, writer_task).await {
                Ok(()) => StreamOutcome::Closed,
                Err(e) => {
                    tracing::debug!("Closing stream failed: {}", e);
                    shared.abort();
                    StreamOutcome::Aborted
                }
            },
            Err(e) => {
                tracing::error!("Stream callback error: {}", e);
                shared.begin_closing();
                if let Some(hook) = self.on_error {
                    hook(&e);
                }
                if let Err(close_err) = close(&shared, &writer, writer_task).await {
                    tracing::debug!("Best-effort close after error failed: {}", close_err);
                }
                shared.mark_closed();
                StreamOutcome::Failed(e)
            }
        }
    }
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn abort(shared: &Shared, writer_task: JoinHandle<Result<()>>) -> StreamOutcome {
    shared.abort();
    writer_task.abort();
    StreamOutcome::Aborted
}

async fn close(
    shared: &Shared,
    writer: &WriterHandle,
    writer_task: JoinHandle<Result<()>>,
) -> Result<()> {
    shared.begin_closing();
    writer.close().await?;
    writer_task
        .await
        .map_err(|e| DatastarError::Io(std::io::Error::other(e)))??;
    shared.mark_closed();
    tracing::debug!("Stream closed");
    Ok(())
}

/// Wait for a kept-open stream to be cancelled or released by every clone.
async fn wait_until_released(
    shared: &Shared,
    mut writer_task: JoinHandle<Result<()>>,
) -> StreamOutcome {
    tokio::select! {
        _ = shared.cancellation_token().cancelled() => abort(shared, writer_task),
        result = &mut writer_task => match result {
            Ok(Ok(())) => {
                shared.mark_closed();
                tracing::debug!("Stream released");
                StreamOutcome::Closed
            }
            _ => {
                shared.abort();
                StreamOutcome::Aborted
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn test_builder_configuration() {
        let builder = StreamBuilder::new()
            .keep_open(true)
            .channel_capacity(8)
            .on_error(|_| {})
            .on_abort(|| {});

        assert!(builder.keep_open);
        assert_eq!(builder.writer_config.channel_capacity, 8);
        assert!(builder.on_error.is_some());
        assert!(builder.on_abort.is_some());
    }

    #[tokio::test]
    async fn test_completion_closes_sink() {
        let (client, mut server) = duplex(4096);

        let outcome = StreamBuilder::new()
            .run(client, |sse| async move {
                sse.patch_elements("<p>done</p>").await
            })
            .await;
        assert!(outcome.is_closed());

        let mut out = String::new();
        server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "event: datastar-patch-elements\ndata: elements <p>done</p>\n\n");
    }

    #[tokio::test]
    async fn test_callback_error_runs_hook_then_closes() {
        let (client, mut server) = duplex(4096);
        let seen = Arc::new(AtomicBool::new(false));
        let flag = seen.clone();

        let outcome = StreamBuilder::new()
            .on_error(move |e| {
                assert!(matches!(e, DatastarError::Handler(_)));
                flag.store(true, Ordering::SeqCst);
            })
            .run(client, |sse| async move {
                sse.remove_signals(["a"]).await?;
                Err(DatastarError::handler("boom"))
            })
            .await;

        assert!(matches!(outcome, StreamOutcome::Failed(DatastarError::Handler(_))));
        assert!(seen.load(Ordering::SeqCst));

        // Sink closed: read_to_string reaches EOF.
        let mut out = String::new();
        server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "event: datastar-remove-signals\ndata: paths a\n\n");
    }

    #[tokio::test]
    async fn test_cancellation_seen_at_next_write() {
        let (client, _server) = duplex(4096);
        let token = CancellationToken::new();
        let aborts = Arc::new(AtomicUsize::new(0));
        let counter = aborts.clone();
        let canceller = token.clone();
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();

        let outcome = StreamBuilder::new()
            .cancellation_token(token)
            .on_abort(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .run(client, |sse| async move {
                canceller.cancel();
                tokio::time::sleep(Duration::from_millis(5)).await;

                let err = sse.patch_elements("<p>late</p>").await.unwrap_err();
                assert!(matches!(err, DatastarError::StreamClosed));
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(outcome, StreamOutcome::Aborted));
        assert!(reached.load(Ordering::SeqCst));
        assert_eq!(aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_without_write_aborts_at_teardown() {
        let (client, _server) = duplex(4096);
        let token = CancellationToken::new();
        let aborts = Arc::new(AtomicUsize::new(0));
        let counter = aborts.clone();
        let canceller = token.clone();

        let outcome = StreamBuilder::new()
            .cancellation_token(token)
            .on_abort(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .run(client, |sse| async move {
                canceller.cancel();
                assert!(!sse.is_open());
                Ok(())
            })
            .await;

        assert!(matches!(outcome, StreamOutcome::Aborted));
        assert_eq!(aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_aborts_without_error_hook() {
        let (client, server) = duplex(4096);
        drop(server);
        let errors = Arc::new(AtomicUsize::new(0));
        let aborts = Arc::new(AtomicUsize::new(0));
        let (e, a) = (errors.clone(), aborts.clone());

        let outcome = StreamBuilder::new()
            .on_error(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            })
            .on_abort(move || {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .run(client, |sse| async move {
                sse.patch_signals(&serde_json::json!({ "x": 1 })).await
            })
            .await;

        assert!(matches!(outcome, StreamOutcome::Aborted));
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert_eq!(aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keep_open_until_clones_dropped() {
        let (client, mut server) = duplex(4096);

        let outcome = StreamBuilder::new()
            .keep_open(true)
            .run(client, |sse| async move {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    sse.remove_fragments("#late").await
                });
                Ok(())
            })
            .await;
        assert!(outcome.is_closed());

        let mut out = String::new();
        server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "event: datastar-remove-fragments\ndata: selector #late\n\n");
    }

    #[tokio::test]
    async fn test_keep_open_cancelled() {
        let (client, _server) = duplex(4096);
        let token = CancellationToken::new();
        let canceller = token.clone();

        let run = StreamBuilder::new()
            .keep_open(true)
            .cancellation_token(token)
            .run(client, |sse| async move {
                // Hold a clone so the stream stays open.
                tokio::spawn(async move {
                    sse.cancellation_token().cancelled().await;
                });
                Ok(())
            });

        let (outcome, _) = tokio::join!(run, async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        assert!(matches!(outcome, StreamOutcome::Aborted));
    }

    #[tokio::test]
    async fn test_writes_after_close_rejected() {
        let (client, _server) = duplex(4096);
        let (tx, rx) = tokio::sync::oneshot::channel();

        let outcome = StreamBuilder::new()
            .run(client, |sse| async move {
                let _ = tx.send(sse.clone());
                Ok(())
            })
            .await;
        assert!(outcome.is_closed());

        let sse = rx.await.unwrap();
        assert_eq!(sse.state(), StreamState::Closed);
        let err = sse.patch_elements("<p></p>").await.unwrap_err();
        assert!(matches!(err, DatastarError::StreamClosed));
    }
}
