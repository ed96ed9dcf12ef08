//! axum integration.
//!
//! - [`DatastarResponse`] runs a stream and serves it as an SSE response
//! - [`ReadSignals`] extracts the client's signals from a request
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use datastar_sse::server::{DatastarResponse, ReadSignals};
//! use datastar_sse::signals::Signals;
//!
//! async fn counter(ReadSignals(signals): ReadSignals<Signals>) -> impl IntoResponse {
//!     let count = signals.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
//!     DatastarResponse::new(move |sse| async move {
//!         sse.patch_signals(&serde_json::json!({ "count": count + 1 })).await
//!     })
//! }
//!
//! let app = Router::new().route("/counter", get(counter));
//! ```

use std::future::Future;

use axum::body::Body;
use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;

use crate::error::{ReadSignalsError, Result};
use crate::signals::{read_signals_as, ReadSignalsConfig, Signals};
use crate::stream::{ServerSentEventGenerator, StreamBuilder};

/// Capacity of the in-memory pipe between the stream and the response body.
pub const DEFAULT_PIPE_CAPACITY: usize = 16 * 1024;

/// An SSE response driven by a stream callback.
///
/// The stream runs on its own task and writes into an in-memory pipe whose
/// read half is the response body. When the client disconnects the body is
/// dropped, the next write fails, and the stream aborts.
pub struct DatastarResponse<F> {
    builder: StreamBuilder,
    callback: F,
}

impl<F, Fut> DatastarResponse<F>
where
    F: FnOnce(ServerSentEventGenerator) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    /// Respond with a stream using default options.
    pub fn new(callback: F) -> Self {
        Self::with_builder(StreamBuilder::new(), callback)
    }

    /// Respond with a stream configured by `builder`.
    pub fn with_builder(builder: StreamBuilder, callback: F) -> Self {
        Self { builder, callback }
    }
}

impl<F, Fut> IntoResponse for DatastarResponse<F>
where
    F: FnOnce(ServerSentEventGenerator) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn into_response(self) -> Response {
        let (sink, source) = tokio::io::duplex(DEFAULT_PIPE_CAPACITY);
        let Self { builder, callback } = self;

        tokio::spawn(async move {
            let outcome = builder.run(sink, callback).await;
            tracing::debug!("Datastar stream finished: {:?}", outcome);
        });

        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            Body::from_stream(ReaderStream::new(source)),
        )
            .into_response()
    }
}

/// Extractor for the client's signals.
///
/// Rejects with `400 Bad Request` and the reader's error message.
#[derive(Debug, Clone)]
pub struct ReadSignals<T = Signals>(pub T);

/// Rejection returned by [`ReadSignals`].
#[derive(Debug)]
pub struct ReadSignalsRejection(pub ReadSignalsError);

impl IntoResponse for ReadSignalsRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0.to_string()).into_response()
    }
}

impl<S, T> FromRequest<S> for ReadSignals<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ReadSignalsRejection;

    async fn from_request(req: Request, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        read_signals_as(req, &ReadSignalsConfig::default())
            .await
            .map(ReadSignals)
            .map_err(|e| {
                tracing::warn!("Rejecting request signals: {}", e);
                ReadSignalsRejection(e)
            })
    }
}
