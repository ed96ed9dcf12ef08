//! `datastar-remove-fragments` and `datastar-remove-signals` intents.

use super::EventOptions;
use crate::error::{DatastarError, Result};
use crate::protocol::{datalines, EventType, Frame};

/// Remove the elements matching a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveFragments {
    selector: String,
    use_view_transition: Option<bool>,
    options: EventOptions,
}

event_options!(RemoveFragments);

impl RemoveFragments {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            use_view_transition: None,
            options: EventOptions::default(),
        }
    }

    /// Ask the client to wrap the removal in a view transition.
    pub fn use_view_transition(mut self, enabled: bool) -> Self {
        self.use_view_transition = Some(enabled);
        self
    }
}

impl From<RemoveFragments> for Frame {
    fn from(intent: RemoveFragments) -> Self {
        let mut frame = Frame::new(EventType::RemoveFragments);
        frame.push_data(datalines::SELECTOR, &intent.selector);
        if let Some(enabled) = intent.use_view_transition {
            frame.push_data(datalines::USE_VIEW_TRANSITION, enabled.to_string());
        }
        intent.options.apply(frame)
    }
}

/// Remove signals by dotted path (e.g. `user.name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveSignals {
    paths: Vec<String>,
    options: EventOptions,
}

event_options!(RemoveSignals);

impl RemoveSignals {
    /// # Errors
    ///
    /// Returns `NoSignalPaths` if `paths` is empty.
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(DatastarError::NoSignalPaths);
        }
        Ok(Self {
            paths,
            options: EventOptions::default(),
        })
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl From<RemoveSignals> for Frame {
    fn from(intent: RemoveSignals) -> Self {
        let mut frame = Frame::new(EventType::RemoveSignals);
        for path in &intent.paths {
            frame.push_data(datalines::PATHS, path);
        }
        intent.options.apply(frame)
    }
}
