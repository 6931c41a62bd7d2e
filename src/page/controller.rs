//! The page controller: one rendered chapter page and its interactions.
//!
//! The controller owns the rendering surface and the per-load context. Host
//! services (chrome, scrolling, page changes) and the audio player are passed
//! in per call, so the controller never holds a reference back to its owner.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{LoadId, PageAssembler, PageConfig, PageContext, SentenceRef};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::highlight::HighlightStore;
use crate::router::{BookNavigation, Intent, NavigationRequest, Point, Rect, Router, js_string};

/// The web view (or equivalent) that displays a page and runs page scripts.
pub trait RenderSurface {
    fn load_html(&mut self, html: &str, base_url: &str);

    /// Run a script in the loaded page and return its result as a string.
    fn evaluate(&mut self, script: &str) -> Option<String>;
}

/// Reader-level services the page controller drives.
pub trait ReaderHost: BookNavigation {
    fn change_page(&mut self, href: &str);
    fn scroll_to(&mut self, offset: f64, animated: bool);
    fn toggle_chrome(&mut self);
    fn hide_chrome(&mut self);
    fn chrome_hidden(&self) -> bool;
    fn present_browser(&mut self, url: &str);
    /// Returns true when the platform accepted the URL.
    fn open_external(&mut self, url: &str) -> bool;
    fn show_highlight_menu(&mut self, rect: Rect, with_note: bool);
    /// Height (or width, when scrolling horizontally) of the visible area.
    fn viewport_extent(&self) -> f64;
}

pub trait AudioPlayer {
    fn play(&mut self, href: &str, fragment_id: &str);
}

/// Raw chapter content and the URL relative resources resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub html: String,
    pub base_url: String,
}

impl Chapter {
    pub fn new(html: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base_url: base_url.into(),
        }
    }
}

/// A tap waiting for its delay to elapse.
///
/// The host runs [`PageController::complete_tap`] with this value once
/// `delay` has passed. A reload in between makes the tap stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTap {
    pub load: LoadId,
    pub point: Point,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The tap landed on a marked sentence.
    Sentence { index: usize, text: String },
    ToggledChrome,
    /// The page was reloaded after the tap.
    Stale,
    Nothing,
}

type ClassCallback = Box<dyn FnMut(Option<&str>, Point)>;

const SELECTED_TEXT_SCRIPT: &str = "getSelectedText()";
const CLEAR_SELECTION_SCRIPT: &str = "clearSelection()";
const CONTENT_HEIGHT_SCRIPT: &str = "getContentHeight()";

pub struct PageController<S> {
    page_number: usize,
    last_load: LoadId,
    context: Option<PageContext>,
    surface: S,
    assembler: PageAssembler,
    router: Router,
    page: PageConfig,
    /// Click callbacks keyed by listener scheme, in registration order.
    callbacks: Vec<(String, ClassCallback)>,
    should_show_bar: bool,
    menu_visible: bool,
}

impl<S> fmt::Debug for PageController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageController")
            .field("page_number", &self.page_number)
            .field("last_load", &self.last_load)
            .field("loaded", &self.context.is_some())
            .field("menu_visible", &self.menu_visible)
            .finish_non_exhaustive()
    }
}

impl<S: RenderSurface> PageController<S> {
    pub fn new(page_number: usize, surface: S, config: &ReaderConfig) -> Self {
        Self {
            page_number,
            last_load: LoadId(0),
            context: None,
            surface,
            assembler: PageAssembler::new(config),
            router: Router::new(&config.listeners),
            page: config.page.clone(),
            callbacks: Vec::new(),
            should_show_bar: true,
            menu_visible: false,
        }
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn context(&self) -> Option<&PageContext> {
        self.context.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn set_should_show_bar(&mut self, show: bool) {
        self.should_show_bar = show;
    }

    pub fn set_menu_visible(&mut self, visible: bool) {
        self.menu_visible = visible;
    }

    pub fn menu_visible(&self) -> bool {
        self.menu_visible
    }

    /// Register a callback for clicks reported through a listener scheme.
    pub fn on_class_click<F>(&mut self, scheme: impl Into<String>, callback: F)
    where
        F: FnMut(Option<&str>, Point) + 'static,
    {
        self.callbacks.push((scheme.into(), Box::new(callback)));
    }

    /// Reuse this controller for another page.
    pub fn recycle(&mut self, page_number: usize) {
        debug!(from = self.page_number, to = page_number, "Recycling page");
        self.page_number = page_number;
        self.context = None;
        self.menu_visible = false;
    }

    /// Render `chapter` with its stored highlights and hand it to the surface.
    pub fn load<H>(&mut self, chapter: &Chapter, store: &H, book_id: &str) -> LoadId
    where
        H: HighlightStore + ?Sized,
    {
        let highlights = match store.highlights_for(book_id, self.page_number) {
            Ok(highlights) => highlights,
            Err(err) => {
                warn!(book_id, page = self.page_number, "Failed to read highlights: {err}");
                Vec::new()
            }
        };

        let rendered = self.assembler.render(&chapter.html, &highlights);
        self.last_load = self.last_load.next();
        info!(
            page = self.page_number,
            load = %self.last_load,
            sentences = rendered.sentences.len(),
            "Loading page"
        );

        self.surface.load_html(&rendered.html, &chapter.base_url);
        self.context = Some(PageContext::new(self.last_load, rendered));
        self.last_load
    }

    /// Install the configured class listeners in the freshly loaded page.
    pub fn did_finish_load(&mut self) {
        for listener in self.router.listeners() {
            debug!(scheme = %listener.scheme_name, "Registering class listener");
            self.surface.evaluate(&listener.registration_script());
        }
    }

    pub fn sentence(&self, sentence: SentenceRef) -> Result<&str> {
        match &self.context {
            Some(context) => context.sentence(sentence),
            None => Err(Error::StaleSentence {
                index: sentence.index,
                load: sentence.load,
                current: self.last_load,
            }),
        }
    }

    /// First half of tap handling.
    ///
    /// Returns the continuation to run after the tap delay, or `None` when
    /// the tap is fully handled (or ignored) already.
    pub fn handle_tap<H>(&mut self, point: Point, host: &mut H) -> Option<PendingTap>
    where
        H: ReaderHost + ?Sized,
    {
        if !host.chrome_hidden() {
            if self.page.hide_navigation_on_tap {
                host.hide_chrome();
            }
            return None;
        }

        let selection = self.surface.evaluate(SELECTED_TEXT_SCRIPT).unwrap_or_default();
        if !selection.trim().is_empty() {
            debug!("Tap ignored, text is selected");
            return None;
        }
        self.surface.evaluate(CLEAR_SELECTION_SCRIPT);

        let load = self.context.as_ref()?.load();
        Some(PendingTap {
            load,
            point,
            delay: self.page.tap_delay(),
        })
    }

    /// Second half of tap handling, after the delay.
    pub fn complete_tap<H>(&mut self, pending: PendingTap, host: &mut H) -> TapOutcome
    where
        H: ReaderHost + ?Sized,
    {
        if self.context.as_ref().map(PageContext::load) != Some(pending.load) {
            debug!(load = %pending.load, current = %self.last_load, "Dropping stale tap");
            return TapOutcome::Stale;
        }

        let script = format!(
            "getSentenceIndexAtPoint({}, {})",
            pending.point.x, pending.point.y
        );
        let index = self
            .surface
            .evaluate(&script)
            .and_then(|value| value.trim().parse::<usize>().ok());

        if let Some(index) = index {
            match self.sentence(SentenceRef {
                load: pending.load,
                index,
            }) {
                Ok(text) => {
                    return TapOutcome::Sentence {
                        index,
                        text: text.to_string(),
                    };
                }
                Err(err) => warn!("Tapped sentence could not be resolved: {err}"),
            }
        }

        if self.should_show_bar && !self.menu_visible {
            host.toggle_chrome();
            TapOutcome::ToggledChrome
        } else {
            TapOutcome::Nothing
        }
    }

    /// Route a navigation request and carry out the intent.
    ///
    /// Returns whether the surface should proceed with the navigation.
    pub fn handle_navigation<H, A>(
        &mut self,
        request: &NavigationRequest,
        host: &mut H,
        audio: &mut A,
    ) -> bool
    where
        H: ReaderHost + ?Sized,
        A: AudioPlayer + ?Sized,
    {
        match self.router.route(request, self.page_number, &*host) {
            Intent::Allow => true,
            Intent::Consume => false,
            Intent::ShowHighlightMenu { rect, with_note } => {
                self.menu_visible = true;
                host.show_highlight_menu(rect, with_note);
                false
            }
            Intent::PlayAudio { href, fragment_id } => {
                audio.play(&href, &fragment_id);
                false
            }
            Intent::ScrollToAnchor { anchor } => {
                self.handle_anchor(&anchor, false, true, host);
                false
            }
            Intent::ChangePage { href } => {
                host.change_page(&href);
                false
            }
            Intent::OpenInBrowser { url } => {
                host.present_browser(&url);
                false
            }
            Intent::ClassListener {
                scheme,
                payload,
                point,
            } => {
                let mut fired = 0;
                for (_, callback) in self
                    .callbacks
                    .iter_mut()
                    .filter(|(name, _)| name.eq_ignore_ascii_case(&scheme))
                {
                    callback(payload.as_deref(), point);
                    fired += 1;
                }
                if fired == 0 {
                    debug!(scheme = %scheme, "No callback for class listener");
                }
                false
            }
            Intent::OpenExternal { url } => !host.open_external(&url),
        }
    }

    /// Scroll to an element id in the page. Returns the offset scrolled to.
    pub fn handle_anchor<H>(
        &mut self,
        anchor: &str,
        avoid_beginning: bool,
        animated: bool,
        host: &mut H,
    ) -> Option<f64>
    where
        H: ReaderHost + ?Sized,
    {
        let script = format!(
            "getAnchorOffset({}, {})",
            js_string(anchor),
            self.page.horizontal
        );
        let Some(offset) = self
            .surface
            .evaluate(&script)
            .and_then(|value| value.trim().parse::<f64>().ok())
        else {
            warn!(anchor, "No offset for anchor");
            return None;
        };

        if avoid_beginning && offset < host.viewport_extent() * 0.5 {
            return None;
        }
        host.scroll_to(offset, animated);
        Some(offset)
    }

    /// Height of the page content box.
    pub fn content_height(&mut self) -> Option<f64> {
        self.surface
            .evaluate(CONTENT_HEIGHT_SCRIPT)
            .and_then(|value| value.trim().parse::<f64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::MemoryStore;

    #[derive(Default)]
    struct Surface {
        loaded: Vec<String>,
        scripts: Vec<String>,
    }

    impl RenderSurface for Surface {
        fn load_html(&mut self, html: &str, _base_url: &str) {
            self.loaded.push(html.to_string());
        }

        fn evaluate(&mut self, script: &str) -> Option<String> {
            self.scripts.push(script.to_string());
            None
        }
    }

    #[test]
    fn test_each_load_gets_a_new_id() {
        let mut controller = PageController::new(1, Surface::default(), &ReaderConfig::default());
        let chapter = Chapter::new("<p>One. Two.</p>", "file:///book/");

        let first = controller.load(&chapter, &MemoryStore::new(), "b");
        let second = controller.load(&chapter, &MemoryStore::new(), "b");

        assert!(second > first);
        assert_eq!(controller.surface().loaded.len(), 2);
        assert_eq!(controller.context().map(PageContext::load), Some(second));
    }

    #[test]
    fn test_recycle_drops_context() {
        let mut controller = PageController::new(1, Surface::default(), &ReaderConfig::default());
        let load = controller.load(&Chapter::new("<p>One. Two.</p>", ""), &MemoryStore::new(), "b");
        controller.recycle(5);

        assert_eq!(controller.page_number(), 5);
        assert!(controller.context().is_none());
        assert!(controller.sentence(SentenceRef { load, index: 0 }).is_err());
    }
}
