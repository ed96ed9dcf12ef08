//! Wire format constants and enumerations.
//!
//! Every frame on the wire has this shape:
//! ```text
//! event: datastar-patch-elements     ← always
//! id: 42                             ← only when an event id is given
//! retry: 5000                        ← only when retry != 1000 ms
//! data: selector #feed               ← zero or more, order preserved
//! data: elements <li>hello</li>
//!                                    ← blank line terminates the frame
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Retry duration clients assume when the `retry:` line is absent.
pub const DEFAULT_RETRY_DURATION: Duration = Duration::from_millis(1000);

/// Query parameter that carries signals on `GET` requests.
pub const DATASTAR_KEY: &str = "datastar";

/// Default upper bound for an inbound signals payload (1 MiB).
pub const DEFAULT_MAX_SIGNALS_SIZE: usize = 1024 * 1024;

/// Selector used when appending derived script elements.
pub const SCRIPT_TARGET_SELECTOR: &str = "body";

/// Attribute that makes a script element remove itself after running.
pub const AUTO_REMOVE_ATTRIBUTE: &str = r#"data-effect="el.remove()""#;

/// Field names of the `field: value` lines inside an SSE frame.
pub mod fields {
    pub const EVENT: &str = "event";
    pub const ID: &str = "id";
    pub const RETRY: &str = "retry";
    pub const DATA: &str = "data";
}

/// Prefixes of the Datastar data lines (`data: <prefix> <value>`).
pub mod datalines {
    pub const SIGNALS: &str = "signals";
    pub const ONLY_IF_MISSING: &str = "onlyIfMissing";
    pub const ELEMENTS: &str = "elements";
    pub const MODE: &str = "mode";
    pub const SELECTOR: &str = "selector";
    pub const USE_VIEW_TRANSITION: &str = "useViewTransition";
    pub const PATHS: &str = "paths";
}

/// SSE event type of a Datastar frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PatchSignals,
    PatchElements,
    RemoveFragments,
    RemoveSignals,
}

impl EventType {
    /// Wire name written after `event: `.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PatchSignals => "datastar-patch-signals",
            Self::PatchElements => "datastar-patch-elements",
            Self::RemoveFragments => "datastar-remove-fragments",
            Self::RemoveSignals => "datastar-remove-signals",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datastar-patch-signals" => Ok(Self::PatchSignals),
            "datastar-patch-elements" => Ok(Self::PatchElements),
            "datastar-remove-fragments" => Ok(Self::RemoveFragments),
            "datastar-remove-signals" => Ok(Self::RemoveSignals),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// How patched elements are merged into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementPatchMode {
    /// Morph the target element, including itself.
    #[default]
    Outer,
    /// Morph the target's children.
    Inner,
    /// Replace the target without morphing.
    Replace,
    Prepend,
    Append,
    Before,
    After,
    /// Remove the target element.
    Remove,
}

impl ElementPatchMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Outer => "outer",
            Self::Inner => "inner",
            Self::Replace => "replace",
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Before => "before",
            Self::After => "after",
            Self::Remove => "remove",
        }
    }

    /// Check if this is the mode clients assume when no `mode` line is sent.
    #[inline]
    pub fn is_default(&self) -> bool {
        *self == Self::Outer
    }
}

impl fmt::Display for ElementPatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementPatchMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outer" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            "replace" => Ok(Self::Replace),
            "prepend" => Ok(Self::Prepend),
            "append" => Ok(Self::Append),
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when parsing an unknown event type or patch mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// Check if a retry duration must be written to the wire.
#[inline]
pub fn is_default_retry(retry: Duration) -> bool {
    retry == DEFAULT_RETRY_DURATION
}
