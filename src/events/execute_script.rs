//! Script execution, derived from an element patch.
//!
//! There is no script event on the wire. [`ExecuteScript`] renders a
//! `<script>` element and converts into a [`PatchElements`] that appends it
//! to `body`:
//!
//! ```text
//! ExecuteScript { script: "go()", attributes: [type="module"], auto_remove: true }
//!   → <script type="module" data-effect="el.remove()">go()</script>
//!   → PatchElements { mode: append, selector: body }
//! ```

use super::{EventOptions, PatchElements};
use crate::protocol::{ElementPatchMode, Frame, AUTO_REMOVE_ATTRIBUTE, SCRIPT_TARGET_SELECTOR};

/// One attribute of the generated `<script>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAttribute {
    /// Inserted verbatim, e.g. `defer` or `type="module"`.
    Raw(String),
    /// Rendered as `name="value"` with the value escaped.
    Pair(String, String),
}

impl ScriptAttribute {
    fn render(&self, out: &mut String) {
        match self {
            Self::Raw(raw) => out.push_str(raw),
            Self::Pair(name, value) => {
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
        }
    }
}

/// Run a script on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteScript {
    script: String,
    attributes: Vec<ScriptAttribute>,
    auto_remove: bool,
    options: EventOptions,
}

event_options!(ExecuteScript);

impl ExecuteScript {
    /// Run `script`; the element removes itself afterwards by default.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            attributes: Vec::new(),
            auto_remove: true,
            options: EventOptions::default(),
        }
    }

    /// Add a raw attribute, inserted verbatim.
    pub fn attribute(mut self, raw: impl Into<String>) -> Self {
        self.attributes.push(ScriptAttribute::Raw(raw.into()));
        self
    }

    /// Add raw attributes in order.
    pub fn attributes<I, A>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.attributes
            .extend(raw.into_iter().map(|a| ScriptAttribute::Raw(a.into())));
        self
    }

    /// Add a `name="value"` attribute.
    pub fn attribute_pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push(ScriptAttribute::Pair(name.into(), value.into()));
        self
    }

    /// Add `name="value"` attributes in iteration order.
    pub fn attribute_map<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes.extend(
            pairs
                .into_iter()
                .map(|(k, v)| ScriptAttribute::Pair(k.into(), v.into())),
        );
        self
    }

    /// Keep or remove the script element after it runs.
    pub fn auto_remove(mut self, auto_remove: bool) -> Self {
        self.auto_remove = auto_remove;
        self
    }

    /// Render the `<script>` element.
    ///
    /// Explicit attributes come first, the auto-remove attribute last.
    pub fn markup(&self) -> String {
        let mut out = String::with_capacity(self.script.len() + 64);
        out.push_str("<script");
        for attribute in &self.attributes {
            out.push(' ');
            attribute.render(&mut out);
        }
        if self.auto_remove {
            out.push(' ');
            out.push_str(AUTO_REMOVE_ATTRIBUTE);
        }
        out.push('>');
        out.push_str(&self.script);
        out.push_str("</script>");
        out
    }
}

impl From<ExecuteScript> for PatchElements {
    fn from(intent: ExecuteScript) -> Self {
        let mut patch = PatchElements::new(intent.markup())
            .mode(ElementPatchMode::Append)
            .selector(SCRIPT_TARGET_SELECTOR);
        if let Some(id) = intent.options.id {
            patch = patch.event_id(id);
        }
        if let Some(retry) = intent.options.retry {
            patch = patch.retry(retry);
        }
        patch
    }
}

impl From<ExecuteScript> for Frame {
    fn from(intent: ExecuteScript) -> Self {
        PatchElements::from(intent).into()
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EventType;
    use std::time::Duration;

    #[test]
    fn test_default_markup() {
        let intent = ExecuteScript::new("console.log('hi')");
        assert_eq!(
            intent.markup(),
            r#"<script data-effect="el.remove()">console.log('hi')</script>"#
        );
    }

    #[test]
    fn test_routed_through_patch_elements() {
        let frame: Frame = ExecuteScript::new("go()").into();
        assert_eq!(frame.event_type, EventType::PatchElements);
        assert_eq!(
            frame.data_lines,
            vec![
                "mode append",
                "selector body",
                r#"elements <script data-effect="el.remove()">go()</script>"#,
            ]
        );

        let via_patch: Frame = PatchElements::from(ExecuteScript::new("go()")).into();
        assert_eq!(frame, via_patch);
    }

    #[test]
    fn test_auto_remove_after_attributes() {
        let intent = ExecuteScript::new("x()")
            .attribute(r#"type="module""#)
            .attribute("defer");
        assert_eq!(
            intent.markup(),
            r#"<script type="module" defer data-effect="el.remove()">x()</script>"#
        );
    }

    #[test]
    fn test_attribute_map_in_order() {
        let intent = ExecuteScript::new("x()")
            .attribute_map([("nonce", "abc"), ("data-role", "a\"b")])
            .auto_remove(false);
        assert_eq!(
            intent.markup(),
            r#"<script nonce="abc" data-role="a&quot;b">x()</script>"#
        );
    }

    #[test]
    fn test_mixed_attribute_shapes() {
        let intent = ExecuteScript::new("")
            .attributes(["async"])
            .attribute_pair("id", "boot");
        assert_eq!(
            intent.markup(),
            r#"<script async id="boot" data-effect="el.remove()"></script>"#
        );
    }

    #[test]
    fn test_multiline_script() {
        let frame: Frame = ExecuteScript::new("a();\nb();").auto_remove(false).into();
        assert_eq!(
            frame.values("elements").collect::<Vec<_>>(),
            vec!["<script>a();", "b();</script>"]
        );
    }

    #[test]
    fn test_options_carried_over() {
        let frame: Frame = ExecuteScript::new("x()")
            .event_id("s1")
            .retry(Duration::from_secs(2))
            .into();
        assert_eq!(frame.id.as_deref(), Some("s1"));
        assert_eq!(frame.retry, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let intent = ExecuteScript::new("x()").attribute_pair("nonce", "n");
        let a: Frame = intent.clone().into();
        let b: Frame = intent.into();
        assert_eq!(a.encode(), b.encode());
    }
}
