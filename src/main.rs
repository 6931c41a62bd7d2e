//! pagemark - prepare ebook chapter pages and inspect navigation routing

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use pagemark::router::{BookNavigation, NavigationKind};
use pagemark::util::decode_chapter;
use pagemark::{
    Highlight, HighlightStore, MemoryStore, NavigationRequest, PageAssembler, ReaderConfig,
    Router, load_config,
};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

#[derive(Parser)]
#[command(name = "pagemark")]
#[command(version, about = "Prepare ebook chapter pages for reading", long_about = None)]
#[command(after_help = "EXAMPLES:
    pagemark render ch1.xhtml -o page.html            Mark sentences in a chapter
    pagemark render ch1.xhtml --highlights h.json     Restore highlights too
    pagemark route 'play-audio://frag-3'              Show how a URL is handled")]
struct Cli {
    /// Reader configuration (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a chapter: restore highlights, mark sentences, inject assets
    Render {
        /// Chapter file (HTML or XHTML)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// JSON array of highlight records
        #[arg(long, value_name = "FILE")]
        highlights: Option<PathBuf>,

        /// Book id used to select highlights
        #[arg(long, default_value = "book")]
        book: String,

        /// Page number used to select highlights
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Emit the rendered page and its sentences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the intent a navigation URL is routed to
    Route {
        url: String,

        /// Treat the request as a clicked link
        #[arg(long)]
        link_clicked: bool,

        /// Current page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Href of the current chapter
        #[arg(long)]
        chapter: Option<String>,

        /// Book content directory that prefixes in-book hrefs
        #[arg(long, default_value = "OEBPS")]
        base: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let reload_handle = init_tracing();
    let config = match &cli.config {
        Some(path) => load_config(path),
        None => ReaderConfig::default(),
    };
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        set_log_level(&reload_handle, &config.log_level);
    }

    let result = match cli.command {
        Command::Render {
            input,
            output,
            highlights,
            book,
            page,
            json,
        } => render(
            &config,
            &input,
            output.as_deref(),
            highlights.as_deref(),
            &book,
            page,
            json,
        ),
        Command::Route {
            url,
            link_clicked,
            page,
            chapter,
            base,
        } => route(&config, url, link_clicked, page, chapter, base),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the subscriber before the config is read, so config warnings are
/// logged. RUST_LOG wins over `log_level` from the config.
fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = level_filter(level);
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to apply log level from config: {err}");
    } else {
        debug!(%level, "Applied log level from config");
    }
}

#[derive(Serialize)]
struct RenderOutput<'a> {
    html: &'a str,
    sentences: &'a [String],
    applied: &'a [String],
    missing: &'a [String],
}

fn render(
    config: &ReaderConfig,
    input: &Path,
    output: Option<&Path>,
    highlights: Option<&Path>,
    book: &str,
    page: usize,
    json: bool,
) -> pagemark::Result<()> {
    let bytes = fs::read(input)?;
    let html = decode_chapter(&bytes);

    let records: Vec<Highlight> = match highlights {
        Some(path) => {
            let store = MemoryStore::from_json(&fs::read_to_string(path)?)?;
            debug!(records = store.len(), "Loaded highlight records");
            store.highlights_for(book, page)?
        }
        None => Vec::new(),
    };

    let rendered = PageAssembler::new(config).render(&html, &records);
    info!(
        input = %input.display(),
        sentences = rendered.sentences.len(),
        applied = rendered.applied.len(),
        missing = rendered.missing.len(),
        "Rendered chapter"
    );

    let text = if json {
        serde_json::to_string_pretty(&RenderOutput {
            html: &rendered.html,
            sentences: rendered.sentences.as_slice(),
            applied: &rendered.applied,
            missing: &rendered.missing,
        })?
    } else {
        rendered.html
    };

    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

struct CliBook {
    base: String,
    chapter: Option<String>,
    page: usize,
}

impl BookNavigation for CliBook {
    fn content_base(&self) -> String {
        self.base.clone()
    }

    fn page_for_href(&self, href: &str) -> Option<usize> {
        (self.chapter.as_deref() == Some(href)).then_some(self.page)
    }

    fn current_chapter_href(&self) -> Option<String> {
        self.chapter.clone()
    }
}

fn route(
    config: &ReaderConfig,
    url: String,
    link_clicked: bool,
    page: usize,
    chapter: Option<String>,
    base: String,
) -> pagemark::Result<()> {
    let request = NavigationRequest {
        url: Some(url),
        kind: if link_clicked {
            NavigationKind::LinkClicked
        } else {
            NavigationKind::Other
        },
    };
    let book = CliBook {
        base,
        chapter,
        page,
    };

    let intent = Router::new(&config.listeners).route(&request, page, &book);
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_level_filter_from_config() {
        assert_eq!(level_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            level_filter("pagemark=trace,warn").max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_invalid_level_falls_back_to_info() {
        assert_eq!(
            level_filter("pagemark=loud").max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_warnings_reach_the_installed_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(&path, "log_level = [1, 2]").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let (filter_layer, handle) = reload::Layer::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .with_filter(filter_layer),
        );

        let dispatch = tracing::Dispatch::new(subscriber);
        tracing::dispatcher::with_default(&dispatch, || {
            let config = load_config(&path);
            set_log_level(&handle, &config.log_level);
        });

        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Invalid config TOML"));
        handle
            .with_current(|filter| assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO)))
            .unwrap();
    }
}
