//! Page content assembly and the per-load render context.
//!
//! [`PageAssembler::render`] runs the fixed pipeline over a raw chapter:
//!
//! 1. the highlight locator splices stored highlights into the raw text,
//! 2. the result is parsed and decorated with reader assets,
//! 3. the segmenter marks sentences in the tree,
//! 4. the tree is serialized for the rendering surface.
//!
//! Highlights go first so that their tags already exist when the segmenter
//! walks text nodes; a sentence boundary never cuts a highlight tag in two.
//! If the tree stage fails, the locator output is returned unchanged.

mod assets;
mod controller;

pub use assets::PageConfig;
pub use controller::{
    AudioPlayer, Chapter, PageController, PendingTap, ReaderHost, RenderSurface, TapOutcome,
};

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::dom;
use crate::error::{Error, Result};
use crate::highlight::{Highlight, HighlightLocator};
use crate::segment::{SentenceList, Segmenter};

/// Identifies one load cycle of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LoadId(pub u64);

impl LoadId {
    pub fn next(self) -> Self {
        LoadId(self.0 + 1)
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sentence index as reported by the rendered page, tagged with the load
/// that produced the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceRef {
    pub load: LoadId,
    pub index: usize,
}

/// Output of one assembler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub html: String,
    pub sentences: SentenceList,
    /// Highlights placed in the page.
    pub applied: Vec<String>,
    /// Highlights whose text was not found.
    pub missing: Vec<String>,
    /// False when the tree stage failed and the locator output was kept.
    pub segmented: bool,
}

/// Runs locator, decoration and segmentation over raw chapter HTML.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    locator: HighlightLocator,
    segmenter: Segmenter,
    page: PageConfig,
}

impl PageAssembler {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            locator: HighlightLocator::new(&config.highlight, &config.segmenter),
            segmenter: Segmenter::new(config.segmenter.clone()),
            page: config.page.clone(),
        }
    }

    /// Produce the final page HTML and its sentence list.
    pub fn render(&self, raw_html: &str, highlights: &[Highlight]) -> Rendered {
        let located = self.locator.apply(raw_html, highlights);

        match self.annotate(&located.html) {
            Ok((html, sentences)) => {
                debug!(
                    applied = located.applied.len(),
                    missing = located.missing.len(),
                    sentences = sentences.len(),
                    "Rendered page"
                );
                Rendered {
                    html,
                    sentences,
                    applied: located.applied,
                    missing: located.missing,
                    segmented: true,
                }
            }
            Err(err) => {
                warn!("Sentence segmentation failed, loading page without markers: {err}");
                Rendered {
                    html: located.html,
                    sentences: SentenceList::new(),
                    applied: located.applied,
                    missing: located.missing,
                    segmented: false,
                }
            }
        }
    }

    fn annotate(&self, html: &str) -> Result<(String, SentenceList)> {
        let mut parsed = dom::parse_document(html);
        if self.segmenter.config().strict
            && let Some(first) = parsed.errors.first()
        {
            return Err(Error::MalformedDocument(first.to_string()));
        }

        if self.page.has_decorations() {
            self.page.decorate(&mut parsed.document);
        }
        let sentences = self.segmenter.segment_document(&mut parsed.document)?;

        Ok((dom::serialize(&parsed.document), sentences))
    }
}

/// Everything derived from one load of a page.
///
/// A context is created by each load and replaced wholesale by the next one;
/// sentence lookups check the caller's [`LoadId`] against it.
#[derive(Debug, Clone)]
pub struct PageContext {
    load: LoadId,
    rendered: Rendered,
}

impl PageContext {
    pub fn new(load: LoadId, rendered: Rendered) -> Self {
        Self { load, rendered }
    }

    pub fn load(&self) -> LoadId {
        self.load
    }

    pub fn html(&self) -> &str {
        &self.rendered.html
    }

    pub fn sentences(&self) -> &SentenceList {
        &self.rendered.sentences
    }

    pub fn rendered(&self) -> &Rendered {
        &self.rendered
    }

    /// Resolve a sentence reference from the rendered page.
    pub fn sentence(&self, sentence: SentenceRef) -> Result<&str> {
        if sentence.load != self.load {
            return Err(Error::StaleSentence {
                index: sentence.index,
                load: sentence.load,
                current: self.load,
            });
        }
        self.rendered
            .sentences
            .get(sentence.index)
            .ok_or(Error::SentenceOutOfRange(sentence.index))
    }
}
