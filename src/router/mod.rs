//! Navigation routing.
//!
//! Every navigation request raised by the rendering surface passes through
//! [`Router::route`], which classifies it into an [`Intent`]. The router is
//! pure: it never touches the surface or the host, so the caller decides how
//! to carry each intent out.
//!
//! Rules are checked in order, first match wins:
//!
//! | request                                   | intent                      |
//! |-------------------------------------------|-----------------------------|
//! | no URL, no scheme, `about:`, `mailto:`    | [`Intent::Allow`]           |
//! | `highlight://{{x,y},{w,h}}`               | [`Intent::ShowHighlightMenu`] |
//! | `highlight-with-note://...`               | same, with a note           |
//! | `play-audio://href#fragment`              | [`Intent::PlayAudio`]       |
//! | `file:` into the book, same page          | [`Intent::ScrollToAnchor`] / [`Intent::Consume`] |
//! | `file:` into the book, other page         | [`Intent::ChangePage`]      |
//! | clicked `http(s):` link                   | [`Intent::OpenInBrowser`]   |
//! | registered listener scheme with a point   | [`Intent::ClassListener`]   |
//! | anything else                             | [`Intent::OpenExternal`]    |

mod listener;
mod payload;
mod url;

pub use listener::{ClassListenerConfig, js_string};
pub use payload::{Point, Rect, parse_click_position};
pub use url::FileUrl;

use serde::Serialize;
use tracing::{debug, trace, warn};

pub const HIGHLIGHT_SCHEME: &str = "highlight";
pub const HIGHLIGHT_WITH_NOTE_SCHEME: &str = "highlight-with-note";
pub const PLAY_AUDIO_SCHEME: &str = "play-audio";

const CLICK_POSITION_MARKER: &str = "/clientX=";

/// How a navigation was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationKind {
    LinkClicked,
    #[default]
    Other,
}

/// A navigation the rendering surface is about to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: Option<String>,
    pub kind: NavigationKind,
}

impl NavigationRequest {
    pub fn link_clicked(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            kind: NavigationKind::LinkClicked,
        }
    }

    pub fn other(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            kind: NavigationKind::Other,
        }
    }
}

/// What the book knows about its own layout.
pub trait BookNavigation {
    /// Path component that precedes every in-book href, usually the directory
    /// holding the package document.
    fn content_base(&self) -> String;

    /// 1-based page number of the chapter at `href`.
    fn page_for_href(&self, href: &str) -> Option<usize>;

    /// Href of the chapter shown on the current page.
    fn current_chapter_href(&self) -> Option<String>;
}

/// The decision for one navigation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Intent {
    /// Let the surface perform the navigation.
    Allow,
    /// Cancel the navigation and do nothing else.
    Consume,
    ShowHighlightMenu {
        rect: Rect,
        with_note: bool,
    },
    PlayAudio {
        href: String,
        fragment_id: String,
    },
    ScrollToAnchor {
        anchor: String,
    },
    ChangePage {
        href: String,
    },
    OpenInBrowser {
        url: String,
    },
    ClassListener {
        scheme: String,
        payload: Option<String>,
        point: Point,
    },
    /// Hand the URL to the platform; allowed only if nothing handles it.
    OpenExternal {
        url: String,
    },
}

impl Intent {
    /// Whether the surface may go ahead with the navigation.
    ///
    /// [`Intent::OpenExternal`] is left to the host and reports `false` here.
    pub fn allows_navigation(&self) -> bool {
        matches!(self, Intent::Allow)
    }
}

/// Classifies navigation requests for one reader.
#[derive(Debug, Clone, Default)]
pub struct Router {
    listeners: Vec<ClassListenerConfig>,
}

impl Router {
    pub fn new(listeners: &[ClassListenerConfig]) -> Self {
        Self {
            listeners: listeners.to_vec(),
        }
    }

    pub fn listeners(&self) -> &[ClassListenerConfig] {
        &self.listeners
    }

    pub fn add_listener(&mut self, listener: ClassListenerConfig) {
        self.listeners.push(listener);
    }

    /// Every configured listener reporting through `scheme`, in config order.
    pub fn listeners_for<'a>(
        &'a self,
        scheme: &'a str,
    ) -> impl Iterator<Item = &'a ClassListenerConfig> + 'a {
        self.listeners
            .iter()
            .filter(move |l| l.scheme_name.eq_ignore_ascii_case(scheme))
    }

    /// Classify a navigation request.
    pub fn route<B>(&self, request: &NavigationRequest, page_number: usize, book: &B) -> Intent
    where
        B: BookNavigation + ?Sized,
    {
        let Some(url) = request.url.as_deref().filter(|u| !u.is_empty()) else {
            return Intent::Allow;
        };
        let Some(scheme) = url::scheme(url) else {
            trace!(url, "No scheme, allowing");
            return Intent::Allow;
        };

        let intent = if scheme.eq_ignore_ascii_case(HIGHLIGHT_SCHEME) {
            highlight_menu(url, scheme, false)
        } else if scheme.eq_ignore_ascii_case(HIGHLIGHT_WITH_NOTE_SCHEME) {
            highlight_menu(url, scheme, true)
        } else if scheme.eq_ignore_ascii_case(PLAY_AUDIO_SCHEME) {
            play_audio(url, scheme, book)
        } else if scheme.eq_ignore_ascii_case("file") {
            file_navigation(url, page_number, book)
        } else if scheme.eq_ignore_ascii_case("about") || scheme.eq_ignore_ascii_case("mailto") {
            Intent::Allow
        } else if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
            if request.kind == NavigationKind::LinkClicked {
                Intent::OpenInBrowser {
                    url: url.to_string(),
                }
            } else {
                Intent::Allow
            }
        } else if let Some(intent) = self.class_listener(url, scheme) {
            intent
        } else {
            Intent::OpenExternal {
                url: url.to_string(),
            }
        };

        debug!(url, ?intent, "Routed navigation");
        intent
    }

    fn class_listener(&self, url: &str, scheme: &str) -> Option<Intent> {
        let listeners = self.listeners_for(scheme).count();
        if listeners == 0 {
            return None;
        }
        let split = url.find(CLICK_POSITION_MARKER)?;
        let (base, position) = url.split_at(split);

        let Some(point) = parse_click_position(position) else {
            warn!(url, "Malformed click position in listener URL");
            return None;
        };
        let payload = url::after_scheme(base, scheme);
        let payload = if payload.is_empty() {
            None
        } else {
            url::decode(payload)
        };

        trace!(scheme, listeners, "Class listener click");
        Some(Intent::ClassListener {
            scheme: scheme.to_string(),
            payload,
            point,
        })
    }
}

fn highlight_menu(url: &str, scheme: &str, with_note: bool) -> Intent {
    let Some(decoded) = url::decode(url) else {
        warn!(url, "Highlight URL is not valid UTF-8");
        return Intent::Allow;
    };
    match Rect::parse(url::after_scheme(&decoded, scheme)) {
        Some(rect) => Intent::ShowHighlightMenu { rect, with_note },
        None => {
            warn!(url, "Malformed highlight rect");
            Intent::Allow
        }
    }
}

fn play_audio<B: BookNavigation + ?Sized>(url: &str, scheme: &str, book: &B) -> Intent {
    let Some(decoded) = url::decode(url) else {
        return Intent::Allow;
    };
    let fragment_id = url::after_scheme(&decoded, scheme);
    Intent::PlayAudio {
        href: book.current_chapter_href().unwrap_or_default(),
        fragment_id: fragment_id.to_string(),
    }
}

fn file_navigation<B: BookNavigation + ?Sized>(url: &str, page_number: usize, book: &B) -> Intent {
    let file = FileUrl::parse(url);

    if !file.has_extension() {
        return match file.fragment {
            Some(anchor) => Intent::ScrollToAnchor { anchor },
            None => Intent::Allow,
        };
    }

    let base = book.content_base();
    if base.is_empty() {
        return Intent::Allow;
    }
    let mut parts = file.path.split(base.as_str());
    parts.next();
    let Some(rest) = parts.next().filter(|r| !r.is_empty()) else {
        trace!(url, base = %base, "File URL outside the book");
        return Intent::Allow;
    };
    let href = rest.trim_matches('/').to_string();

    if book.page_for_href(&href) == Some(page_number) {
        match file.fragment {
            Some(anchor) => Intent::ScrollToAnchor { anchor },
            None => Intent::Consume,
        }
    } else {
        Intent::ChangePage { href }
    }
}
