//! # pagemark
//!
//! Page preparation and interaction routing for an ebook reader.
//!
//! Before a chapter is shown, pagemark restores the reader's stored highlights
//! into its HTML, marks every sentence with a tappable marker, and injects the
//! reader's assets. While the page is shown, it classifies navigation requests
//! raised by the page (highlight taps, audio playback, in-book links, external
//! links) and resolves taps to sentences.
//!
//! ## Quick Start
//!
//! ```
//! use pagemark::{Highlight, PageAssembler, ReaderConfig};
//!
//! let assembler = PageAssembler::new(&ReaderConfig::default());
//! let highlight = Highlight::new("h1", "book", 1).with_text("Hello ", "world", ". Bye");
//!
//! let page = assembler.render("<p>Hello world. Bye.</p>", &[highlight]);
//! assert_eq!(page.applied, ["h1"]);
//! assert_eq!(page.sentences.as_slice(), ["Hello world", " Bye", ""]);
//! ```
//!
//! ## Routing
//!
//! ```
//! use pagemark::router::{BookNavigation, Intent, NavigationRequest, Router};
//!
//! struct Book;
//!
//! impl BookNavigation for Book {
//!     fn content_base(&self) -> String {
//!         "OEBPS".into()
//!     }
//!     fn page_for_href(&self, href: &str) -> Option<usize> {
//!         (href == "ch2.xhtml").then_some(2)
//!     }
//!     fn current_chapter_href(&self) -> Option<String> {
//!         Some("ch1.xhtml".into())
//!     }
//! }
//!
//! let request = NavigationRequest::link_clicked("file:///b/OEBPS/ch2.xhtml");
//! assert_eq!(
//!     Router::default().route(&request, 1, &Book),
//!     Intent::ChangePage { href: "ch2.xhtml".into() }
//! );
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod page;
pub mod router;
pub mod segment;
pub mod util;

pub use config::{ReaderConfig, load_config};
pub use error::{Error, Result};
pub use highlight::{Highlight, HighlightStore, HighlightStyle, MemoryStore};
pub use page::{
    Chapter, LoadId, PageAssembler, PageContext, PageController, Rendered, SentenceRef,
    TapOutcome,
};
pub use router::{Intent, NavigationRequest, Router};
pub use segment::{Segmenter, SentenceList};
