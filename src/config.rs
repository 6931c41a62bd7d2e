//! Reader configuration loaded from TOML.
//!
//! ```toml
//! log_level = "info"
//!
//! [page]
//! tap_delay_ms = 300
//! stylesheets = ["Style.css"]
//!
//! [[listeners]]
//! scheme_name = "footnote"
//! query_selector = "a.noteref"
//! attribute_name = "href"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::highlight::HighlightConfig;
use crate::page::PageConfig;
use crate::router::ClassListenerConfig;
use crate::segment::SegmenterConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub highlight: HighlightConfig,
    pub segmenter: SegmenterConfig,
    pub page: PageConfig,
    pub listeners: Vec<ClassListenerConfig>,
    pub log_level: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            highlight: HighlightConfig::default(),
            segmenter: SegmenterConfig::default(),
            page: PageConfig::default(),
            listeners: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl ReaderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read the configuration at `path`, falling back to defaults.
pub fn load_config(path: &Path) -> ReaderConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded reader config");
            data
        }
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default config: {err}");
            return ReaderConfig::default();
        }
    };

    match ReaderConfig::from_toml_str(&contents) {
        Ok(config) => {
            debug!(listeners = config.listeners.len(), "Parsed configuration from disk");
            config
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            ReaderConfig::default()
        }
    }
}
