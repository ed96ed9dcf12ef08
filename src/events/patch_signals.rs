//! `datastar-patch-signals` intent.

use serde::Serialize;

use super::EventOptions;
use crate::error::{json_type_name, DatastarError, Result};
use crate::protocol::{datalines, EventType, Frame};

/// Merge a JSON object into the client's signals.
///
/// The signals are serialized once when the intent is built, so encoding
/// failures surface at construction instead of at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSignals {
    signals: String,
    only_if_missing: bool,
    options: EventOptions,
}

event_options!(PatchSignals);

impl PatchSignals {
    /// Serialize `signals` to JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails and `SignalsNotObject` if the
    /// value does not serialize to a JSON object.
    pub fn new<T: Serialize + ?Sized>(signals: &T) -> Result<Self> {
        let json = serde_json::to_string(signals)?;
        if !json.starts_with('{') {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            return Err(DatastarError::SignalsNotObject(json_type_name(&value)));
        }
        Ok(Self::serialized(json))
    }

    /// Use an already serialized JSON object as-is.
    ///
    /// The text is parsed once to check it, then sent unchanged, so its
    /// formatting and key order are kept.
    ///
    /// # Errors
    ///
    /// Returns `Json` if `json` is not valid JSON and `SignalsNotObject` if
    /// it is not an object.
    pub fn from_json(json: impl Into<String>) -> Result<Self> {
        let json = json.into();
        match serde_json::from_str::<serde_json::Value>(&json)? {
            serde_json::Value::Object(_) => Ok(Self::serialized(json)),
            other => Err(DatastarError::SignalsNotObject(json_type_name(&other))),
        }
    }

    fn serialized(signals: String) -> Self {
        Self {
            signals,
            only_if_missing: false,
            options: EventOptions::default(),
        }
    }

    /// Only patch signals that do not exist on the client yet.
    pub fn only_if_missing(mut self, only_if_missing: bool) -> Self {
        self.only_if_missing = only_if_missing;
        self
    }

    /// The serialized signals.
    pub fn json(&self) -> &str {
        &self.signals
    }
}

impl From<PatchSignals> for Frame {
    fn from(intent: PatchSignals) -> Self {
        let mut frame = Frame::new(EventType::PatchSignals);
        if intent.only_if_missing {
            frame.push_data(datalines::ONLY_IF_MISSING, "true");
        }
        frame.push_multiline(datalines::SIGNALS, &intent.signals);
        intent.options.apply(frame)
    }
}
