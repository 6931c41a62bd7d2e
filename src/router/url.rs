//! Minimal URL dissection for navigation requests.
//!
//! Requests arrive as raw strings from the rendering surface; only the pieces
//! routing needs are extracted here.

use percent_encoding::percent_decode_str;

/// The scheme of `url`, if it has a syntactically valid one.
pub fn scheme(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(candidate)
}

/// Percent-decode a string; `None` when the result is not valid UTF-8.
pub fn decode(s: &str) -> Option<String> {
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// The part of `url` after `scheme://` (or `scheme:`).
pub fn after_scheme<'a>(url: &'a str, scheme: &str) -> &'a str {
    let rest = url.get(scheme.len()..).unwrap_or_default();
    rest.strip_prefix("://")
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
}

/// A `file:` URL split into decoded path and fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrl {
    pub path: String,
    pub fragment: Option<String>,
}

impl FileUrl {
    pub fn parse(url: &str) -> FileUrl {
        let rest = after_scheme(url, "file");
        let (before_fragment, fragment) = match rest.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment)),
            None => (rest, None),
        };
        let raw_path = before_fragment
            .split_once('?')
            .map_or(before_fragment, |(path, _)| path);

        FileUrl {
            path: decode(raw_path).unwrap_or_else(|| raw_path.to_string()),
            fragment: fragment
                .filter(|f| !f.is_empty())
                .map(|f| decode(f).unwrap_or_else(|| f.to_string())),
        }
    }

    /// Whether the last path segment has a file extension.
    pub fn has_extension(&self) -> bool {
        let name = self.path.rsplit('/').next().unwrap_or_default();
        name.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
    }
}
