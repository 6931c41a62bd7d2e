//! Routing of navigation requests raised by a rendered page.

use pagemark::router::{
    BookNavigation, ClassListenerConfig, Intent, NavigationKind, NavigationRequest, Point, Rect,
    Router,
};

struct Book {
    chapter: &'static str,
}

impl BookNavigation for Book {
    fn content_base(&self) -> String {
        "OEBPS".to_string()
    }

    fn page_for_href(&self, href: &str) -> Option<usize> {
        ["Text/ch1.xhtml", "Text/ch2.xhtml", "Text/ch3.xhtml"]
            .iter()
            .position(|h| *h == href)
            .map(|i| i + 1)
    }

    fn current_chapter_href(&self) -> Option<String> {
        Some(self.chapter.to_string())
    }
}

const BOOK: Book = Book {
    chapter: "Text/ch2.xhtml",
};

fn clicked(url: &str) -> Intent {
    Router::default().route(&NavigationRequest::link_clicked(url), 2, &BOOK)
}

#[test]
fn test_play_audio_dispatches_fragment_after_prefix() {
    let url = "play-audio://smil-par-0042";
    assert_eq!("play-audio://".len(), 13);

    assert_eq!(
        clicked(url),
        Intent::PlayAudio {
            href: "Text/ch2.xhtml".into(),
            fragment_id: url[13..].into(),
        }
    );
}

#[test]
fn test_play_audio_fragment_is_percent_decoded() {
    assert_eq!(
        clicked("play-audio://par%20one"),
        Intent::PlayAudio {
            href: "Text/ch2.xhtml".into(),
            fragment_id: "par one".into(),
        }
    );
}

#[test]
fn test_highlight_with_note_rect() {
    assert_eq!(
        clicked("highlight-with-note://%7B%7B12.5,%2030%7D,%20%7B200,%2018%7D%7D"),
        Intent::ShowHighlightMenu {
            rect: Rect {
                x: 12.5,
                y: 30.0,
                width: 200.0,
                height: 18.0,
            },
            with_note: true,
        }
    );
}

#[test]
fn test_in_book_links() {
    assert_eq!(
        clicked("file:///var/books/1984/OEBPS/Text/ch2.xhtml#part-2"),
        Intent::ScrollToAnchor {
            anchor: "part-2".into()
        }
    );
    assert_eq!(
        clicked("file:///var/books/1984/OEBPS/Text/ch2.xhtml"),
        Intent::Consume
    );
    assert_eq!(
        clicked("file:///var/books/1984/OEBPS/Text/ch3.xhtml#x"),
        Intent::ChangePage {
            href: "Text/ch3.xhtml".into()
        }
    );
}

#[test]
fn test_http_depends_on_navigation_kind() {
    assert_eq!(
        clicked("http://example.org/"),
        Intent::OpenInBrowser {
            url: "http://example.org/".into()
        }
    );

    let request = NavigationRequest {
        url: Some("https://example.org/frame".into()),
        kind: NavigationKind::Other,
    };
    assert!(Router::default().route(&request, 2, &BOOK).allows_navigation());
}

#[test]
fn test_listener_scheme() {
    let mut router = Router::default();
    router.add_listener(ClassListenerConfig::new("glossary", ".term", "data-term"));

    let request = NavigationRequest::link_clicked("glossary://Big%20Brother/clientX=40&clientY=512");
    assert_eq!(
        router.route(&request, 2, &BOOK),
        Intent::ClassListener {
            scheme: "glossary".into(),
            payload: Some("Big Brother".into()),
            point: Point::new(40.0, 512.0),
        }
    );

    let without_point = NavigationRequest::link_clicked("glossary://Big%20Brother");
    assert!(matches!(
        router.route(&without_point, 2, &BOOK),
        Intent::OpenExternal { .. }
    ));
}

#[test]
fn test_intent_serializes_with_action_tag() {
    let json = serde_json::to_value(clicked("file:///b/OEBPS/Text/ch1.xhtml")).unwrap();
    assert_eq!(json["action"], "change-page");
    assert_eq!(json["href"], "Text/ch1.xhtml");
}
