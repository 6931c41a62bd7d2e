//! Stored highlights and their restoration into chapter HTML.
//!
//! Highlights are created by a user selection elsewhere and persisted in an
//! external keyed store. At render time the page asks the store for the
//! records of the current (book, page) pair and the [`HighlightLocator`]
//! splices them back into the chapter text.

mod locator;

pub use locator::{HighlightLocator, LocateReport};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A persisted highlight record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Unique identifier, written to the tag's `id` attribute.
    pub id: String,
    #[serde(alias = "book_id")]
    pub book_id: String,
    /// 1-based page (spine position) the highlight belongs to.
    pub page: usize,
    /// The highlighted text as it appears in the chapter source.
    pub content: String,
    /// Text immediately preceding `content`, used to disambiguate duplicates.
    #[serde(default, alias = "content_pre")]
    pub content_pre: String,
    /// Text immediately following `content`.
    #[serde(default, alias = "content_post")]
    pub content_post: String,
    #[serde(default)]
    pub style: HighlightStyle,
    #[serde(default, alias = "note_id", skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
}

impl Highlight {
    pub fn new(id: impl Into<String>, book_id: impl Into<String>, page: usize) -> Self {
        Self {
            id: id.into(),
            book_id: book_id.into(),
            page,
            content: String::new(),
            content_pre: String::new(),
            content_post: String::new(),
            style: HighlightStyle::default(),
            note_id: None,
        }
    }

    /// Set the highlighted text and its surrounding context.
    pub fn with_text(mut self, pre: &str, content: &str, post: &str) -> Self {
        self.content_pre = pre.to_string();
        self.content = content.to_string();
        self.content_post = post.to_string();
        self
    }

    pub fn with_style(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_note(mut self, note_id: impl Into<String>) -> Self {
        self.note_id = Some(note_id.into());
        self
    }

    pub fn has_note(&self) -> bool {
        self.note_id.is_some()
    }
}

/// Visual style of a highlight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Underline,
}

impl HighlightStyle {
    /// CSS class applied to the highlight tag.
    pub fn class_name(self) -> &'static str {
        match self {
            HighlightStyle::Yellow => "highlight-yellow",
            HighlightStyle::Green => "highlight-green",
            HighlightStyle::Blue => "highlight-blue",
            HighlightStyle::Pink => "highlight-pink",
            HighlightStyle::Underline => "highlight-underline",
        }
    }
}

/// How highlight tags are written into the chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Inline element name wrapping the highlighted text.
    pub tag_name: String,
    /// Script handler for plain highlights.
    pub click_handler: String,
    /// Script handler for highlights that carry a note.
    pub note_click_handler: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            tag_name: "highlight".to_string(),
            click_handler: "callHighlightURL(this);".to_string(),
            note_click_handler: "callHighlightWithNoteURL(this);".to_string(),
        }
    }
}

/// Source of highlight records keyed by book and page.
pub trait HighlightStore {
    /// Records for one page, in the order they should be applied.
    fn highlights_for(&self, book_id: &str, page: usize) -> Result<Vec<Highlight>>;
}

/// In-memory [`HighlightStore`], preserving insertion order per page.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pages: HashMap<(String, usize), Vec<Highlight>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a flat list of records.
    pub fn from_records(records: impl IntoIterator<Item = Highlight>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Parse a JSON array of highlight records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<Highlight> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn insert(&mut self, highlight: Highlight) {
        self.pages
            .entry((highlight.book_id.clone(), highlight.page))
            .or_default()
            .push(highlight);
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HighlightStore for MemoryStore {
    fn highlights_for(&self, book_id: &str, page: usize) -> Result<Vec<Highlight>> {
        Ok(self
            .pages
            .get(&(book_id.to_string(), page))
            .cloned()
            .unwrap_or_default())
    }
}
