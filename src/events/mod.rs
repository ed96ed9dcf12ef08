//! Events module - typed intents and their data-line mapping.
//!
//! Each intent converts into a [`Frame`](crate::protocol::Frame) through
//! `From`, laying out control lines before payload lines:
//!
//! | Intent              | Event type                  | Data lines                                        |
//! |---------------------|-----------------------------|---------------------------------------------------|
//! | [`PatchSignals`]    | `datastar-patch-signals`    | `onlyIfMissing`, `signals`…                       |
//! | [`PatchElements`]   | `datastar-patch-elements`   | `mode`, `selector`, `useViewTransition`, `elements`… |
//! | [`RemoveFragments`] | `datastar-remove-fragments` | `selector`, `useViewTransition`                   |
//! | [`RemoveSignals`]   | `datastar-remove-signals`   | `paths`…                                          |
//! | [`ExecuteScript`]   | `datastar-patch-elements`   | derived through [`PatchElements`]                 |
//!
//! # Example
//!
//! ```
//! use datastar_sse::events::PatchElements;
//! use datastar_sse::protocol::{ElementPatchMode, Frame};
//!
//! let frame: Frame = PatchElements::new("<div>x</div>")
//!     .mode(ElementPatchMode::Append)
//!     .selector("body")
//!     .into();
//!
//! assert_eq!(frame.data_lines, ["mode append", "selector body", "elements <div>x</div>"]);
//! ```

/// Adds the `event_id` and `retry` setters to an intent builder.
macro_rules! event_options {
    ($ty:ty) => {
        impl $ty {
            /// Set the event id.
            pub fn event_id(mut self, id: impl Into<String>) -> Self {
                self.options.id = Some(id.into());
                self
            }

            /// Set the client reconnect delay.
            pub fn retry(mut self, retry: std::time::Duration) -> Self {
                self.options.retry = Some(retry);
                self
            }
        }
    };
}

mod execute_script;
mod patch_elements;
mod patch_signals;
mod remove;

use std::time::Duration;

use crate::protocol::Frame;

pub use execute_script::{ExecuteScript, ScriptAttribute};
pub use patch_elements::PatchElements;
pub use patch_signals::PatchSignals;
pub use remove::{RemoveFragments, RemoveSignals};

/// Per-frame options shared by every intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOptions {
    /// Event id, written as `id:` so clients can resume.
    pub id: Option<String>,
    /// Reconnect delay, written as `retry:` unless it is the default.
    pub retry: Option<Duration>,
}

impl EventOptions {
    fn apply(self, mut frame: Frame) -> Frame {
        frame.id = self.id;
        frame.retry = self.retry;
        frame
    }
}
