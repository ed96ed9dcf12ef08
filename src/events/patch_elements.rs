//! `datastar-patch-elements` intent.

use super::EventOptions;
use crate::protocol::{datalines, ElementPatchMode, EventType, Frame};

/// Patch pre-rendered markup into the client's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchElements {
    elements: String,
    mode: ElementPatchMode,
    selector: Option<String>,
    use_view_transition: Option<bool>,
    options: EventOptions,
}

event_options!(PatchElements);

impl PatchElements {
    /// Patch `elements` using the default (`outer`) mode.
    pub fn new(elements: impl Into<String>) -> Self {
        Self {
            elements: elements.into(),
            mode: ElementPatchMode::default(),
            selector: None,
            use_view_transition: None,
            options: EventOptions::default(),
        }
    }

    /// Remove the elements matching `selector`.
    pub fn remove(selector: impl Into<String>) -> Self {
        Self::new(String::new())
            .mode(ElementPatchMode::Remove)
            .selector(selector)
    }

    /// Set the merge mode.
    pub fn mode(mut self, mode: ElementPatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Target elements matching a CSS selector instead of by id.
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Ask the client to wrap the patch in a view transition.
    pub fn use_view_transition(mut self, enabled: bool) -> Self {
        self.use_view_transition = Some(enabled);
        self
    }

    pub fn elements(&self) -> &str {
        &self.elements
    }

    pub fn patch_mode(&self) -> ElementPatchMode {
        self.mode
    }

    pub fn target_selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }
}

impl From<PatchElements> for Frame {
    fn from(intent: PatchElements) -> Self {
        let mut frame = Frame::new(EventType::PatchElements);
        if !intent.mode.is_default() {
            frame.push_data(datalines::MODE, intent.mode.as_str());
        }
        if let Some(selector) = &intent.selector {
            frame.push_data(datalines::SELECTOR, selector);
        }
        if let Some(enabled) = intent.use_view_transition {
            frame.push_data(datalines::USE_VIEW_TRANSITION, enabled.to_string());
        }
        frame.push_multiline(datalines::ELEMENTS, &intent.elements);
        intent.options.apply(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_has_no_control_lines() {
        let frame: Frame = PatchElements::new(r#"<div id="a">x</div>"#).into();
        assert_eq!(frame.event_type, EventType::PatchElements);
        assert_eq!(frame.data_lines, vec![r#"elements <div id="a">x</div>"#]);
    }

    #[test]
    fn test_append_to_body_order() {
        let frame: Frame = PatchElements::new("<div>x</div>")
            .mode(ElementPatchMode::Append)
            .selector("body")
            .into();
        assert_eq!(
            frame.data_lines,
            vec!["mode append", "selector body", "elements <div>x</div>"]
        );
    }

    #[test]
    fn test_explicit_outer_mode_omitted() {
        let frame: Frame = PatchElements::new("<p></p>")
            .mode(ElementPatchMode::Outer)
            .into();
        assert_eq!(frame.values("mode").count(), 0);
    }

    #[test]
    fn test_view_transition_line() {
        let frame: Frame = PatchElements::new("<p></p>")
            .selector("#p")
            .use_view_transition(true)
            .into();
        assert_eq!(
            frame.data_lines,
            vec!["selector #p", "useViewTransition true", "elements <p></p>"]
        );

        let frame: Frame = PatchElements::new("<p></p>").use_view_transition(false).into();
        assert_eq!(frame.data_lines[0], "useViewTransition false");
    }

    #[test]
    fn test_multiline_content() {
        let frame: Frame = PatchElements::new("<ul>\n  <li>1</li>\n</ul>").into();
        assert_eq!(
            frame.data_lines,
            vec!["elements <ul>", "elements   <li>1</li>", "elements </ul>"]
        );
    }

    #[test]
    fn test_remove_by_selector() {
        let intent = PatchElements::remove("#toast");
        assert_eq!(intent.patch_mode(), ElementPatchMode::Remove);
        assert_eq!(intent.target_selector(), Some("#toast"));
        assert!(intent.elements().is_empty());

        let frame: Frame = intent.into();
        assert_eq!(frame.data_lines, vec!["mode remove", "selector #toast"]);
    }
}
