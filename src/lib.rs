//! # datastar-sse
//!
//! Server-side wire layer for the Datastar hypermedia protocol.
//!
//! This crate turns server intents into Server-Sent-Events frames and reads
//! the client's signals back from incoming requests.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): frame encoder and decoder for the SSE text format
//! - **Events** ([`events`]): typed intents mapped onto ordered data lines
//! - **Signals** ([`signals`]): inbound signal reader (query for `GET`, body otherwise)
//! - **Stream** ([`stream`]): lifecycle of one response over any `AsyncWrite` sink
//! - **Writer** ([`writer`]): single task that owns the sink and orders writes
//!
//! ## Example
//!
//! ```ignore
//! use datastar_sse::StreamBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let outcome = StreamBuilder::new()
//!         .run(tokio::io::stdout(), |sse| async move {
//!             sse.patch_elements(r#"<div id="hello">Hello</div>"#).await?;
//!             sse.patch_signals(&serde_json::json!({ "greeted": true })).await
//!         })
//!         .await;
//!
//!     assert!(outcome.is_closed());
//! }
//! ```

pub mod error;
pub mod events;
pub mod protocol;
#[cfg(feature = "axum")]
pub mod server;
pub mod signals;
pub mod stream;
pub mod writer;

pub use error::{DatastarError, ReadSignalsError};
pub use events::{ExecuteScript, PatchElements, PatchSignals, RemoveFragments, RemoveSignals};
pub use signals::{read_signals, Signals};
pub use stream::{ServerSentEventGenerator, StreamBuilder, StreamOutcome};
