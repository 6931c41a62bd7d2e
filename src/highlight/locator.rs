//! Context-anchored highlight restoration.
//!
//! Each highlight is found by its locator string (`content_pre + content +
//! content_post`) and only the `content` part of the first literal match is
//! rewritten. Highlights are applied one after another on the same buffer, so
//! a later locator sees the tags inserted by earlier ones. Two highlights
//! whose locators overlap can therefore shadow each other; the shadowed one
//! is reported as missing.

use memchr::memmem;
use regex::Regex;
use tracing::{debug, warn};

use super::{Highlight, HighlightConfig};
use crate::dom::escape_attr;
use crate::segment::SegmenterConfig;

/// Outcome of a locator pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateReport {
    /// The chapter HTML with highlight tags spliced in.
    pub html: String,
    /// Identifiers of highlights that were placed.
    pub applied: Vec<String>,
    /// Identifiers of highlights whose locator string was not found.
    pub missing: Vec<String>,
}

/// Finds stored highlights in chapter HTML and wraps them in tags.
#[derive(Debug, Clone)]
pub struct HighlightLocator {
    config: HighlightConfig,
    /// Serialized sentence markers captured into stored context.
    marker_markup: Option<Regex>,
    /// Marker glyph captured into stored context as plain text.
    marker_glyph: String,
}

impl HighlightLocator {
    pub fn new(config: &HighlightConfig, markers: &SegmenterConfig) -> Self {
        let pattern = format!(
            r#"<{tag}\b[^>]*\bclass="[^"]*\b{class}\b[^"]*"[^>]*>[^<]*</{tag}>"#,
            tag = regex::escape(&markers.marker_tag),
            class = regex::escape(&markers.marker_class),
        );
        let marker_markup = match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(%pattern, "Sentence marker pattern rejected, context will not be normalized: {err}");
                None
            }
        };

        Self {
            config: config.clone(),
            marker_markup,
            marker_glyph: markers.marker_glyph.clone(),
        }
    }

    /// Strip sentence-marker artifacts from stored highlight text.
    ///
    /// Highlights are captured from the rendered page, where sentence markers
    /// exist; the chapter source they are matched against never has them.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = match &self.marker_markup {
            Some(re) => re.replace_all(text, "").into_owned(),
            None => text.to_string(),
        };
        if !self.marker_glyph.is_empty() && out.contains(&self.marker_glyph) {
            out = out.replace(&self.marker_glyph, "");
        }
        out
    }

    /// The normalized locator string for a highlight.
    pub fn locator_string(&self, highlight: &Highlight) -> String {
        let mut locator = self.normalize(&highlight.content_pre);
        locator.push_str(&self.normalize(&highlight.content));
        locator.push_str(&self.normalize(&highlight.content_post));
        locator
    }

    /// Build the inline tag wrapping `content` for a highlight.
    pub fn tag(&self, highlight: &Highlight, content: &str) -> String {
        let handler = if highlight.has_note() {
            &self.config.note_click_handler
        } else {
            &self.config.click_handler
        };
        format!(
            "<{tag} id=\"{id}\" onclick=\"{handler}\" class=\"{class}\">{content}</{tag}>",
            tag = self.config.tag_name,
            id = escape_attr(&highlight.id),
            handler = escape_attr(handler),
            class = highlight.style.class_name(),
        )
    }

    /// Splice every locatable highlight into `html`, in the given order.
    pub fn apply(&self, html: &str, highlights: &[Highlight]) -> LocateReport {
        let mut report = LocateReport {
            html: html.to_string(),
            ..Default::default()
        };

        for highlight in highlights {
            let pre = self.normalize(&highlight.content_pre);
            let content = self.normalize(&highlight.content);
            let post = self.normalize(&highlight.content_post);

            if content.is_empty() {
                warn!(id = %highlight.id, "Highlight has no content, skipping");
                report.missing.push(highlight.id.clone());
                continue;
            }

            let locator = format!("{pre}{content}{post}");
            let Some(pos) = memmem::find(report.html.as_bytes(), locator.as_bytes()) else {
                warn!(
                    id = %highlight.id,
                    locator_len = locator.len(),
                    "Highlight text not found in chapter, skipping"
                );
                report.missing.push(highlight.id.clone());
                continue;
            };

            // Needle and haystack are both valid UTF-8, so every offset
            // derived from the match lies on a char boundary.
            let start = pos + pre.len();
            let end = start + content.len();
            let tag = self.tag(highlight, &report.html[start..end]);
            report.html.replace_range(start..end, &tag);

            debug!(id = %highlight.id, offset = start, "Restored highlight");
            report.applied.push(highlight.id.clone());
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::HighlightStyle;
    use proptest::prelude::*;

    fn locator() -> HighlightLocator {
        HighlightLocator::new(&HighlightConfig::default(), &SegmenterConfig::default())
    }

    #[test]
    fn test_wraps_exactly_the_content() {
        let html = "<p>Hello world. Bye.</p>";
        let h = Highlight::new("h1", "b", 1).with_text("Hello ", "world", ". Bye");

        let report = locator().apply(html, &[h]);

        assert_eq!(
            report.html,
            "<p>Hello <highlight id=\"h1\" onclick=\"callHighlightURL(this);\" class=\"highlight-yellow\">world</highlight>. Bye.</p>"
        );
        assert_eq!(report.applied, vec!["h1"]);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_context_disambiguates_duplicates() {
        let html = "<p>the cat sat. the cat ran.</p>";
        let h = Highlight::new("h1", "b", 1).with_text("the ", "cat", " ran");

        let report = locator().apply(html, &[h]);

        assert!(report.html.starts_with("<p>the cat sat. the <highlight"));
        assert!(report.html.ends_with("cat</highlight> ran.</p>"));
    }

    #[test]
    fn test_note_uses_distinct_handler() {
        let html = "<p>Some text here</p>";
        let h = Highlight::new("h1", "b", 1)
            .with_text("Some ", "text", " here")
            .with_style(HighlightStyle::Blue)
            .with_note("n1");

        let report = locator().apply(html, &[h]);

        assert!(report.html.contains("onclick=\"callHighlightWithNoteURL(this);\""));
        assert!(report.html.contains("class=\"highlight-blue\""));
    }

    #[test]
    fn test_missing_locator_leaves_html_untouched() {
        let html = "<p>Hello world.</p>";
        let h = Highlight::new("gone", "b", 1).with_text("Goodbye ", "world", ".");

        let report = locator().apply(html, &[h]);

        assert_eq!(report.html, html);
        assert_eq!(report.missing, vec!["gone"]);
    }

    #[test]
    fn test_empty_content_is_missing() {
        let html = "<p>Hello world.</p>";
        let h = Highlight::new("empty", "b", 1).with_text("Hello", "", " world");

        let report = locator().apply(html, &[h]);

        assert_eq!(report.html, html);
        assert_eq!(report.missing, vec!["empty"]);
    }

    #[test]
    fn test_marker_artifacts_are_stripped_from_context() {
        let html = "<p>First sentence. Second part here.</p>";
        let pre = "First sentence.<span class=\"sentence-marker\" id=\"sentence-0\" data-sentence=\"0\">\u{25B8}</span> ";
        let h = Highlight::new("h1", "b", 1).with_text(pre, "Second", " part");

        let report = locator().apply(html, &[h]);

        assert_eq!(report.applied, vec!["h1"]);
        assert!(report.html.contains(". <highlight id=\"h1\""));
    }

    #[test]
    fn test_marker_glyph_is_stripped_from_context() {
        let l = locator();
        assert_eq!(l.normalize("end.\u{25B8} Next"), "end. Next");
    }

    #[test]
    fn test_overlapping_locators_shadow_later_highlight() {
        let html = "<p>alpha beta gamma</p>";
        let first = Highlight::new("a", "b", 1).with_text("alpha ", "beta", " gamma");
        let second = Highlight::new("b", "b", 1).with_text("alpha ", "beta gamma", "");

        let report = locator().apply(html, &[first, second]);

        assert_eq!(report.applied, vec!["a"]);
        assert_eq!(report.missing, vec!["b"]);
    }

    #[test]
    fn test_identifier_is_attribute_escaped() {
        let html = "<p>quote me</p>";
        let h = Highlight::new("a\"b", "b", 1).with_text("", "quote", " me");

        let report = locator().apply(html, &[h]);

        assert!(report.html.contains("id=\"a&quot;b\""));
    }

    proptest! {
        #[test]
        fn prop_only_content_span_changes(
            before in "[a-z ]{0,20}",
            after in "[a-z ]{0,20}",
            target in "[A-Z]{3,8}",
        ) {
            let html = format!("<p>{before}<b>{target}</b>{after}</p>");
            let h = Highlight::new("id1", "b", 1).with_text("<b>", &target, "</b>");

            let report = locator().apply(&html, &[h.clone()]);

            let start = html.find("<b>").unwrap() + 3;
            let end = start + target.len();
            let expected = format!("{}{}{}", &html[..start], locator().tag(&h, &target), &html[end..]);
            prop_assert_eq!(report.html, expected);
        }

        #[test]
        fn prop_absent_locator_is_identity(
            text in "[a-z .]{0,40}",
            needle in "[A-Z]{4,10}",
        ) {
            let html = format!("<p>{text}</p>");
            let h = Highlight::new("x", "b", 1).with_text("", &needle, "");

            let report = locator().apply(&html, &[h]);

            prop_assert_eq!(report.html, html);
            prop_assert_eq!(report.missing.len(), 1);
        }
    }
}
