//! Sentence segmentation for read-aloud and tap-to-select.
//!
//! Headings, paragraphs and in-page table-of-contents links are split on
//! periods. Every sentence gets a sequential index, and a small marker
//! element carrying that index is inserted right after it:
//!
//! ```
//! use pagemark::segment::{Segmenter, SegmenterConfig};
//!
//! let segmenter = Segmenter::new(SegmenterConfig::default());
//! let out = segmenter.segment("<p>Hello world. This is a test.</p>").unwrap();
//!
//! assert_eq!(out.sentences.as_slice(), ["Hello world", " This is a test", ""]);
//! assert!(out.html.contains("id=\"sentence-0\""));
//! assert!(out.html.contains("id=\"sentence-1\""));
//! ```
//!
//! Index order is fixed: all `h1`, then `h2`, `h3`, `p`, and finally TOC
//! links, each group in document order. Tap handling relies on this order.

mod sentences;

pub use sentences::SentenceList;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{self, Attribute, Document, NodeId};
use crate::error::{Error, Result};

/// Block tags segmented before TOC links, in index order.
const SEGMENTED_TAGS: [&str; 4] = ["h1", "h2", "h3", "p"];

/// Elements whose text is never prose.
const SKIPPED_TEXT_PARENTS: [&str; 2] = ["script", "style"];

/// Marker and filtering settings for the segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Element name of the sentence marker.
    pub marker_tag: String,
    /// Class identifying sentence markers.
    pub marker_class: String,
    /// Prefix of the marker's `id` attribute; the index is appended.
    pub marker_id_prefix: String,
    /// Visible glyph inside the marker. May be empty.
    pub marker_glyph: String,
    /// Class marking anchors that belong to an in-page table of contents.
    pub toc_class: String,
    /// Elements with this class are removed before segmentation.
    pub colophon_class: String,
    /// Treat any parse error reported by html5ever as fatal.
    pub strict: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            marker_tag: "span".to_string(),
            marker_class: "sentence-marker".to_string(),
            marker_id_prefix: "sentence-".to_string(),
            marker_glyph: "\u{25B8}".to_string(),
            toc_class: "toc".to_string(),
            colophon_class: "colophon".to_string(),
            strict: false,
        }
    }
}

/// Result of segmenting a chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub html: String,
    pub sentences: SentenceList,
}

/// Splits prose elements into sentences and marks them in the tree.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

/// A run of output produced from one text node.
enum Piece {
    Text(String),
    Marker(usize),
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Parse `html`, segment it and serialize the result.
    pub fn segment(&self, html: &str) -> Result<Segmented> {
        let mut parsed = dom::parse_document(html);
        if self.config.strict
            && let Some(first) = parsed.errors.first()
        {
            return Err(Error::MalformedDocument(first.to_string()));
        }

        let sentences = self.segment_document(&mut parsed.document)?;
        Ok(Segmented {
            html: dom::serialize(&parsed.document),
            sentences,
        })
    }

    /// Segment an already parsed document in place.
    pub fn segment_document(&self, dom: &mut Document) -> Result<SentenceList> {
        if dom.find_by_tag("body").is_none() {
            return Err(Error::MissingBody);
        }

        self.strip_non_prose(dom);

        let mut targets: Vec<NodeId> = SEGMENTED_TAGS
            .iter()
            .flat_map(|tag| dom.elements_by_tag(tag))
            .collect();
        targets.extend(
            dom.elements_by_tag("a")
                .into_iter()
                .filter(|&a| dom.has_class(a, &self.config.toc_class)),
        );

        let mut sentences = SentenceList::new();
        let mut segmented: HashSet<NodeId> = HashSet::new();

        for element in targets {
            if dom.ancestors(element).any(|a| segmented.contains(&a)) {
                continue;
            }
            if self.segment_element(dom, element, &segmented, &mut sentences) {
                segmented.insert(element);
            }
        }

        debug!(
            elements = segmented.len(),
            sentences = sentences.len(),
            "Segmented chapter"
        );
        Ok(sentences)
    }

    /// Remove colophon blocks and every anchor that is not a TOC link.
    fn strip_non_prose(&self, dom: &mut Document) {
        let colophons = dom.elements_by_class(&self.config.colophon_class);
        let anchors: Vec<NodeId> = dom
            .elements_by_tag("a")
            .into_iter()
            .filter(|&a| !dom.has_class(a, &self.config.toc_class))
            .collect();

        for id in colophons.iter().chain(anchors.iter()) {
            dom.detach(*id);
        }
    }

    /// Text nodes below `element` that carry prose, in document order.
    ///
    /// Text inside script/style, inside existing markers, or inside a
    /// descendant that was already segmented is excluded.
    fn prose_text_nodes(
        &self,
        dom: &Document,
        element: NodeId,
        segmented: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        dom.descendants(element)
            .into_iter()
            .filter(|&id| dom.is_text(id))
            .filter(|&id| {
                dom.ancestors(id).take_while(|&a| a != element).all(|a| {
                    !segmented.contains(&a)
                        && !dom.has_class(a, &self.config.marker_class)
                        && dom
                            .element_name(a)
                            .is_none_or(|n| !SKIPPED_TEXT_PARENTS.contains(&n.as_ref()))
                })
            })
            .collect()
    }

    /// Segment one element. Returns false when the element was left alone.
    fn segment_element(
        &self,
        dom: &mut Document,
        element: NodeId,
        segmented: &HashSet<NodeId>,
        sentences: &mut SentenceList,
    ) -> bool {
        let text_nodes = self.prose_text_nodes(dom, element, segmented);
        let has_lowercase = text_nodes
            .iter()
            .filter_map(|&id| dom.text_content(id))
            .any(|text| text.chars().any(char::is_lowercase));
        if !has_lowercase {
            return false;
        }

        let mut current = String::new();

        for node in text_nodes {
            let original = dom.text_content(node).unwrap_or_default().to_string();
            if !original.contains('.') {
                current.push_str(&original);
                continue;
            }

            let mut pieces = Vec::new();
            let mut pending = String::new();
            let mut parts = original.split('.').peekable();

            while let Some(part) = parts.next() {
                current.push_str(part);
                pending.push_str(part);
                if parts.peek().is_none() {
                    break;
                }
                pending.push('.');

                let tagged = current.chars().count() > 1;
                let index = sentences.push(std::mem::take(&mut current));
                if tagged {
                    pieces.push(Piece::Text(std::mem::take(&mut pending)));
                    pieces.push(Piece::Marker(index));
                }
            }
            if !pending.is_empty() {
                pieces.push(Piece::Text(pending));
            }

            self.replace_text_node(dom, node, pieces);
        }

        let tagged = current.chars().count() > 1;
        let index = sentences.push(current);
        if tagged {
            let marker = self.create_marker(dom, index);
            dom.append(element, marker);
        }

        true
    }

    /// Replace a text node by a sequence of text runs and markers.
    fn replace_text_node(&self, dom: &mut Document, node: NodeId, pieces: Vec<Piece>) {
        let mut anchor = node;
        let mut first = true;

        for piece in pieces {
            match piece {
                Piece::Text(text) if first => dom.set_text(node, text),
                Piece::Text(text) => {
                    let run = dom.create_text(text);
                    dom.insert_after(anchor, run);
                    anchor = run;
                }
                Piece::Marker(index) => {
                    if first {
                        dom.set_text(node, String::new());
                    }
                    let marker = self.create_marker(dom, index);
                    dom.insert_after(anchor, marker);
                    anchor = marker;
                }
            }
            first = false;
        }
    }

    fn create_marker(&self, dom: &mut Document, index: usize) -> NodeId {
        let attrs = vec![
            Attribute::new("class", self.config.marker_class.as_str()),
            Attribute::new("id", format!("{}{index}", self.config.marker_id_prefix)),
            Attribute::new("data-sentence", index.to_string()),
        ];
        let marker = dom.create_html_element(&self.config.marker_tag, attrs);
        if !self.config.marker_glyph.is_empty() {
            dom.append_text(marker, &self.config.marker_glyph);
        }
        marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segment(html: &str) -> Segmented {
        Segmenter::default().segment(html).unwrap()
    }

    fn marker(index: usize) -> String {
        format!(
            "<span class=\"sentence-marker\" id=\"sentence-{index}\" data-sentence=\"{index}\">\u{25B8}</span>"
        )
    }

    #[test]
    fn test_two_sentences_with_trailing_fragment() {
        let out = segment("<p>Hello world. This is a test.</p>");

        assert_eq!(
            out.sentences.as_slice(),
            ["Hello world", " This is a test", ""]
        );
        let expected = format!(
            "<p>Hello world.{} This is a test.{}</p>",
            marker(0),
            marker(1)
        );
        assert!(out.html.contains(&expected), "got {}", out.html);
        assert!(!out.html.contains("sentence-2"));
    }

    #[test]
    fn test_text_without_period_is_one_sentence() {
        let out = segment("<p>No period here</p>");

        assert_eq!(out.sentences.as_slice(), ["No period here"]);
        assert!(out.html.contains(&format!("<p>No period here{}</p>", marker(0))));
    }

    #[test]
    fn test_short_fragment_consumes_index_without_marker() {
        let out = segment("<p>A. B. Done here.</p>");

        assert_eq!(out.sentences.as_slice(), ["A", " B", " Done here", ""]);
        assert!(!out.html.contains("id=\"sentence-0\""));
        assert!(out.html.contains("id=\"sentence-1\""));
        assert!(out.html.contains("id=\"sentence-2\""));
    }

    #[test]
    fn test_element_without_lowercase_is_untouched() {
        let out = segment("<h1>CHAPTER ONE.</h1><p>Text.</p>");

        assert_eq!(out.sentences.as_slice(), ["Text", ""]);
        assert!(out.html.contains("<h1>CHAPTER ONE.</h1>"));
    }

    #[test]
    fn test_index_order_follows_element_kind() {
        let html = "<p>para one.</p><h2>second heading</h2><h1>first heading</h1>\
                    <h3>third heading</h3><a class=\"toc\" href=\"#c1\">toc entry</a>";
        let out = segment(html);

        let sentences: Vec<&str> = out.sentences.iter().collect();
        assert_eq!(
            sentences,
            vec![
                "first heading",
                "second heading",
                "third heading",
                "para one",
                "",
                "toc entry"
            ]
        );
    }

    #[test]
    fn test_plain_anchors_and_colophon_are_removed() {
        let html = "<p>See note<a href=\"#n1\">1</a> here.</p>\
                    <div class=\"colophon\"><p>Typeset in something.</p></div>";
        let out = segment(html);

        assert!(!out.html.contains("<a "));
        assert!(!out.html.contains("Typeset"));
        assert_eq!(out.sentences.as_slice(), ["See note here", ""]);
    }

    #[test]
    fn test_sentence_spans_inline_markup() {
        let out = segment("<p>One <em>two. Three</em> four.</p>");

        assert_eq!(out.sentences.as_slice(), ["One two", " Three four", ""]);
        assert!(out.html.contains(&format!("<em>two.{} Three</em> four.{}", marker(0), marker(1))));
    }

    #[test]
    fn test_highlight_tags_survive_segmentation() {
        let html = "<p>Hello <highlight id=\"h1\" class=\"highlight-yellow\">world</highlight>. Bye.</p>";
        let out = segment(html);

        assert!(out.html.contains("<highlight id=\"h1\" class=\"highlight-yellow\">world</highlight>."));
        assert_eq!(out.sentences.as_slice(), ["Hello world", " Bye", ""]);
    }

    #[test]
    fn test_nested_target_is_not_segmented_twice() {
        let out = segment("<p>Contents: <a class=\"toc\" href=\"#c1\">chapter one</a></p>");

        assert_eq!(out.sentences.as_slice(), ["Contents: chapter one"]);
        assert_eq!(out.html.matches("sentence-marker").count(), 1);
    }

    #[test]
    fn test_script_text_is_ignored() {
        let out = segment("<p>Visible text.<script>var a = b.c;</script></p>");

        assert_eq!(out.sentences.as_slice(), ["Visible text", ""]);
        assert!(out.html.contains("<script>var a = b.c;</script>"));
    }

    #[test]
    fn test_strict_mode_rejects_malformed_markup() {
        let segmenter = Segmenter::new(SegmenterConfig {
            strict: true,
            ..Default::default()
        });

        let result = segmenter.segment("<p><b>unclosed <i>mess</b></p>");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));

        let ok = segmenter.segment(
            "<!DOCTYPE html><html><head></head><body><p>Fine.</p></body></html>",
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let html = "<h1>Title here</h1><p>One. Two.</p><p>Three.</p>";
        assert_eq!(segment(html), segment(html));
    }

    proptest! {
        #[test]
        fn prop_marker_count_matches_long_fragments(
            fragments in prop::collection::vec("[a-z ]{0,6}", 1..8)
        ) {
            let text = fragments.join(".");
            prop_assume!(text.chars().any(|c| c.is_lowercase()));

            let out = segment(&format!("<p>{text}</p>"));

            let expected = text.split('.').filter(|f| f.chars().count() > 1).count();
            prop_assert_eq!(out.html.matches("class=\"sentence-marker\"").count(), expected);
            prop_assert_eq!(out.sentences.len(), fragments.len());
        }
    }
}
