//! Benchmarks for the page preparation pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use pagemark::router::{BookNavigation, NavigationRequest, Router};
use pagemark::util::decode_chapter;
use pagemark::{Highlight, HighlightStore, MemoryStore, PageAssembler, ReaderConfig, Segmenter};

const CHAPTER_BYTES: &[u8] = include_bytes!("../tests/fixtures/chapter.xhtml");
const HIGHLIGHTS_JSON: &str = include_str!("../tests/fixtures/highlights.json");

/// The fixture chapter body repeated into a chapter of realistic length.
fn long_chapter() -> String {
    let chapter = decode_chapter(CHAPTER_BYTES);
    let start = chapter.find("<body>").unwrap() + "<body>".len();
    let end = chapter.find("</body>").unwrap();
    let body = &chapter[start..end];

    let mut html = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body>");
    for _ in 0..200 {
        html.push_str(body);
    }
    html.push_str("</body></html>");
    html
}

fn highlights() -> Vec<Highlight> {
    let store = MemoryStore::from_json(HIGHLIGHTS_JSON).unwrap();
    store.highlights_for("orwell", 1).unwrap()
}

fn bench_render(c: &mut Criterion) {
    let html = long_chapter();
    let highlights = highlights();
    let assembler = PageAssembler::new(&ReaderConfig::default());

    c.bench_function("render_plain", |b| {
        b.iter(|| assembler.render(black_box(&html), &[]));
    });

    c.bench_function("render_with_highlights", |b| {
        b.iter(|| assembler.render(black_box(&html), black_box(&highlights)));
    });
}

fn bench_segment(c: &mut Criterion) {
    let html = long_chapter();
    let segmenter = Segmenter::new(Default::default());

    c.bench_function("segment", |b| {
        b.iter(|| segmenter.segment(black_box(&html)).unwrap());
    });
}

struct Book;

impl BookNavigation for Book {
    fn content_base(&self) -> String {
        "OEBPS".into()
    }

    fn page_for_href(&self, _href: &str) -> Option<usize> {
        Some(3)
    }

    fn current_chapter_href(&self) -> Option<String> {
        Some("Text/ch1.xhtml".into())
    }
}

fn bench_route(c: &mut Criterion) {
    let router = Router::default();
    let requests = [
        NavigationRequest::link_clicked("highlight://%7B%7B10,20%7D,%7B100,40%7D%7D"),
        NavigationRequest::link_clicked("play-audio://par-12"),
        NavigationRequest::link_clicked("file:///books/b/OEBPS/Text/ch2.xhtml#note"),
        NavigationRequest::link_clicked("https://example.org/"),
    ];

    c.bench_function("route", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(router.route(request, 1, &Book));
            }
        });
    });
}

criterion_group!(benches, bench_render, bench_segment, bench_route);
criterion_main!(benches);
