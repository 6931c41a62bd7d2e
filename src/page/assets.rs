//! Reader assets and appearance classes injected into every page.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::{Attribute, Document};

/// Per-page settings: injected assets, appearance and tap behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Delay before a tap's point query runs, letting selection clearing settle.
    pub tap_delay_ms: u64,
    /// Hide reader chrome on tap while it is visible.
    pub hide_navigation_on_tap: bool,
    /// Pages scroll horizontally instead of vertically.
    pub horizontal: bool,
    /// Stylesheet hrefs linked from `<head>`.
    pub stylesheets: Vec<String>,
    /// Script srcs loaded from `<head>`.
    pub scripts: Vec<String>,
    /// Script run inline after the script srcs.
    pub inline_script: Option<String>,
    /// Classes added to `<html>` (font family, font size, overlay style).
    pub html_classes: Vec<String>,
    pub night_mode: bool,
    pub night_mode_class: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            tap_delay_ms: 400,
            hide_navigation_on_tap: true,
            horizontal: false,
            stylesheets: Vec::new(),
            scripts: Vec::new(),
            inline_script: None,
            html_classes: Vec::new(),
            night_mode: false,
            night_mode_class: "nightMode".to_string(),
        }
    }
}

impl PageConfig {
    pub fn tap_delay(&self) -> Duration {
        Duration::from_millis(self.tap_delay_ms)
    }

    /// Whether decorating a document would change it.
    pub fn has_decorations(&self) -> bool {
        !self.stylesheets.is_empty()
            || !self.scripts.is_empty()
            || self.inline_script.is_some()
            || !self.html_classes.is_empty()
            || self.night_mode
    }

    /// Inject assets into `<head>` and appearance classes into `<html>`.
    pub fn decorate(&self, dom: &mut Document) {
        if let Some(head) = dom.find_by_tag("head") {
            for href in &self.stylesheets {
                let link = dom.create_html_element(
                    "link",
                    vec![
                        Attribute::new("rel", "stylesheet"),
                        Attribute::new("type", "text/css"),
                        Attribute::new("href", href.as_str()),
                    ],
                );
                dom.append(head, link);
            }
            for src in &self.scripts {
                let script = dom.create_html_element(
                    "script",
                    vec![
                        Attribute::new("type", "text/javascript"),
                        Attribute::new("src", src.as_str()),
                    ],
                );
                dom.append(head, script);
            }
            if let Some(source) = &self.inline_script {
                let script = dom.create_html_element(
                    "script",
                    vec![Attribute::new("type", "text/javascript")],
                );
                dom.append_text(script, source);
                dom.append(head, script);
            }
        }

        if let Some(html) = dom.find_by_tag("html") {
            for class in &self.html_classes {
                dom.add_class(html, class);
            }
            if self.night_mode {
                dom.add_class(html, &self.night_mode_class);
            }
        }
    }
}
