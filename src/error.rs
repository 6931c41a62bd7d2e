//! Error types for pagemark operations.

use thiserror::Error;

use crate::page::LoadId;

/// Errors that can occur while preparing or interacting with a page.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Document has no body element")]
    MissingBody,

    #[error("Sentence index {index} belongs to load {load}, current load is {current}")]
    StaleSentence {
        index: usize,
        load: LoadId,
        current: LoadId,
    },

    #[error("Sentence index {0} is out of range")]
    SentenceOutOfRange(usize),

    #[error("Highlight store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
