//! Chapter document tree.
//!
//! Chapter HTML is parsed with html5ever into an arena [`Document`], mutated
//! through stable [`NodeId`] handles, and written back out with
//! [`serialize`].
//!
//! ```
//! use pagemark::dom::{parse_document, serialize};
//!
//! let parsed = parse_document("<p>Hello</p>");
//! let html = serialize(&parsed.document);
//! assert!(html.contains("<p>Hello</p>"));
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Document, Node, NodeData, NodeId};
pub use serialize::{escape_attr, escape_text, serialize};

use std::borrow::Cow;

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use serialize::VOID_ELEMENTS;
use tree_sink::DocumentSink;

/// A start tag closed with `/>`. Quoted attribute values may contain `>` or `/`.
static SELF_CLOSING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<([A-Za-z][A-Za-z0-9:._-]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>=`]+))?)*)\s*/>"#,
    )
    .unwrap()
});

/// A parsed document together with the parse errors html5ever reported.
pub struct ParsedDocument {
    pub document: Document,
    pub errors: Vec<Cow<'static, str>>,
}

/// Parse HTML into an arena document.
///
/// Parsing never fails: html5ever repairs malformed markup the way browsers
/// do. Whatever it had to repair is listed in [`ParsedDocument::errors`].
///
/// Chapters are usually XHTML, so self-closing non-void tags such as
/// `<a id="page12"/>` are expanded to an explicit empty element first.
/// The HTML tokenizer would otherwise leave them open around the text
/// that follows.
pub fn parse_document(html: &str) -> ParsedDocument {
    let html = expand_self_closing(html);
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let sink = html5ever::parse_document(DocumentSink::new(), opts)
        .from_utf8()
        .one(html.as_bytes());
    let (document, errors) = sink.into_parts();

    ParsedDocument { document, errors }
}

/// Rewrite `<tag .../>` as `<tag ...></tag>` for every non-void element.
pub fn expand_self_closing(html: &str) -> Cow<'_, str> {
    if !html.contains("/>") {
        return Cow::Borrowed(html);
    }
    SELF_CLOSING_TAG.replace_all(html, |caps: &Captures<'_>| {
        let name = &caps[1];
        if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            caps[0].to_string()
        } else {
            format!("<{name}{}></{name}>", &caps[2])
        }
    })
}
