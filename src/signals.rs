//! Inbound signal reader.
//!
//! Recovers the client's signals from an HTTP request:
//! - `GET`: the `datastar` query parameter holds URL-encoded JSON
//! - any other method: the whole body is the JSON object
//!
//! Failures are returned as [`ReadSignalsError`] values, never raised, so
//! the handler decides whether to ignore or reject the request.
//!
//! # Example
//!
//! ```
//! # tokio_test_block(async {
//! use datastar_sse::signals::read_signals;
//! use http::Request;
//! use http_body_util::Empty;
//! use bytes::Bytes;
//!
//! let req = Request::get("/poll?datastar=%7B%22count%22%3A3%7D")
//!     .body(Empty::<Bytes>::new())
//!     .unwrap();
//!
//! let signals = read_signals(req).await.unwrap();
//! assert_eq!(signals["count"], 3);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use bytes::Bytes;
use http::{Method, Request};
use http_body::Body;
use http_body_util::{BodyExt, Limited};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ReadSignalsError;
use crate::protocol::{DATASTAR_KEY, DEFAULT_MAX_SIGNALS_SIZE};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Signals as sent by the client: a JSON object.
pub type Signals = Map<String, Value>;

/// Outcome of reading signals from a request.
pub type SignalReadResult = std::result::Result<Signals, ReadSignalsError>;

/// Configuration for the signal reader.
#[derive(Debug, Clone)]
pub struct ReadSignalsConfig {
    /// Maximum payload size in bytes, for the query parameter and the body.
    pub max_size: usize,
}

impl Default for ReadSignalsConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIGNALS_SIZE,
        }
    }
}

impl ReadSignalsConfig {
    /// Set the maximum payload size.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

/// Read the signals object with the default configuration.
pub async fn read_signals<B>(req: Request<B>) -> SignalReadResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    read_signals_with(req, &ReadSignalsConfig::default()).await
}

/// Read the signals object.
///
/// Non-object JSON (arrays, numbers, ...) is rejected with
/// [`ReadSignalsError::NotAnObject`].
pub async fn read_signals_with<B>(req: Request<B>, config: &ReadSignalsConfig) -> SignalReadResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let payload = signals_payload(req, config).await?;
    let value = serde_json::from_slice::<Value>(&payload)
        .map_err(|e| ReadSignalsError::Parse(e.to_string()))?;
    match value {
        Value::Object(signals) => Ok(signals),
        _ => Err(ReadSignalsError::NotAnObject),
    }
}

/// Read the signals object and deserialize it into `T`.
///
/// The payload goes through the same checks as [`read_signals_with`], so
/// non-object JSON is rejected with [`ReadSignalsError::NotAnObject`]
/// whatever `T` is.
pub async fn read_signals_as<T, B>(
    req: Request<B>,
    config: &ReadSignalsConfig,
) -> std::result::Result<T, ReadSignalsError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let signals = read_signals_with(req, config).await?;
    serde_json::from_value(Value::Object(signals))
        .map_err(|e| ReadSignalsError::Parse(e.to_string()))
}

/// Extract the raw JSON payload, enforcing the size limit before any parsing.
async fn signals_payload<B>(
    req: Request<B>,
    config: &ReadSignalsConfig,
) -> std::result::Result<Bytes, ReadSignalsError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if *req.method() == Method::GET {
        let query = req.uri().query().unwrap_or_default();
        let value = query_param(query, DATASTAR_KEY).ok_or(ReadSignalsError::MissingParameter)?;
        if value.len() > config.max_size {
            return Err(ReadSignalsError::PayloadTooLarge);
        }
        return Ok(Bytes::from(value));
    }

    let body = Limited::new(req.into_body(), config.max_size);
    match body.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            Err(ReadSignalsError::PayloadTooLarge)
        }
        Err(e) => Err(ReadSignalsError::Parse(e.to_string())),
    }
}

/// First value of `key` in a URL-encoded query string.
fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
