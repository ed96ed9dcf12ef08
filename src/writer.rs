//! Dedicated writer task for the response sink.
//!
//! The sink is owned by a single task that receives encoded frames over an
//! mpsc channel. Every frame carries an acknowledgement channel, so the
//! sender learns whether its bytes reached the sink.
//!
//! # Architecture
//!
//! ```text
//! Generator ─┐
//! Clone 1   ─┼─► mpsc::Sender<Command> ─► Writer Task ─► Sink (AsyncWrite)
//! Clone N   ─┘                                 │
//!                 ◄── oneshot ack per frame ───┘
//! ```
//!
//! Frames are written in the order they were sent. Frames already queued
//! when the task wakes are coalesced into one vectored write, never
//! reordered.

use std::io::{self, IoSlice};

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{DatastarError, Result};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Maximum frames to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 32;

/// An encoded frame waiting to be written.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Encoded frame bytes.
    pub bytes: Bytes,
    ack: oneshot::Sender<io::Result<()>>,
}

/// Messages accepted by the writer task.
#[derive(Debug)]
enum Command {
    Frame(OutboundFrame),
    /// Flush and shut down the sink, then stop.
    Close(oneshot::Sender<io::Result<()>>),
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Channel capacity for the frame queue.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for sending frames to the writer task.
///
/// Cheaply cloneable; all clones feed the same ordered queue.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Command>,
}

impl WriterHandle {
    /// Send encoded bytes and wait until they are written.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the sink rejected the write, `StreamClosed` if the
    /// writer task has already stopped.
    pub async fn send(&self, bytes: Bytes) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Frame(OutboundFrame { bytes, ack }))
            .await
            .map_err(|_| DatastarError::StreamClosed)?;

        done.await
            .map_err(|_| DatastarError::StreamClosed)?
            .map_err(DatastarError::Io)
    }

    /// Flush and shut down the sink after all queued frames.
    pub async fn close(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Close(ack))
            .await
            .map_err(|_| DatastarError::StreamClosed)?;

        done.await
            .map_err(|_| DatastarError::StreamClosed)?
            .map_err(DatastarError::Io)
    }

    /// Check if the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// The task ends when the sink is closed, when a write fails, or when every
/// handle has been dropped. Closing and releasing both flush and shut down
/// the sink.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

/// Spawn the writer task with default configuration.
pub fn spawn_writer_task_default<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_task(writer, WriterConfig::default())
}

/// Main writer loop - receives frames and writes them to the sink.
async fn writer_loop<W>(mut rx: mpsc::Receiver<Command>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let first = match rx.recv().await {
            Some(Command::Frame(frame)) => frame,
            Some(Command::Close(ack)) => {
                let result = shutdown(&mut writer).await;
                let outcome = result.as_ref().map(|_| ()).map_err(copy_error);
                let _ = ack.send(result);
                return outcome.map_err(DatastarError::Io);
            }
            None => {
                // All handles dropped
                return shutdown(&mut writer).await.map_err(DatastarError::Io);
            }
        };

        // Collect frames that are already queued
        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);
        let mut close = None;

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(Command::Frame(frame)) => batch.push(frame),
                Ok(Command::Close(ack)) => {
                    close = Some(ack);
                    break;
                }
                Err(_) => break,
            }
        }

        let result = write_batch(&mut writer, &batch).await;
        tracing::trace!("Wrote batch of {} frame(s)", batch.len());

        if let Err(e) = result {
            for frame in batch {
                let _ = frame.ack.send(Err(copy_error(&e)));
            }
            if let Some(ack) = close {
                let _ = ack.send(Err(copy_error(&e)));
            }
            return Err(DatastarError::Io(e));
        }

        for frame in batch {
            let _ = frame.ack.send(Ok(()));
        }

        if let Some(ack) = close {
            let result = shutdown(&mut writer).await;
            let outcome = result.as_ref().map(|_| ()).map_err(copy_error);
            let _ = ack.send(result);
            return outcome.map_err(DatastarError::Io);
        }
    }
}

async fn shutdown<W>(writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.flush().await?;
    writer.shutdown().await
}

fn copy_error(e: &io::Error) -> io::Error {
    io::Error::new(e.kind(), e.to_string())
}

/// Write a batch of frames using scatter/gather I/O (write_vectored).
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size: usize = batch.iter().map(|f| f.bytes.len()).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(batch, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            ));
        }
        total_written += written;
    }

    writer.flush().await
}

/// Build IoSlice array for remaining data after a partial write.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len());
    let mut offset = 0;

    for frame in batch {
        let end = offset + frame.bytes.len();
        if skip_bytes < end {
            let start = skip_bytes.saturating_sub(offset);
            slices.push(IoSlice::new(&frame.bytes[start..]));
        }
        offset = end;
    }

    slices
}
