//! Decoding chapter bytes into text.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use memchr::memmem;

/// How far into a file the XML declaration is looked for.
const DECLARATION_WINDOW: usize = 128;

/// Decode raw chapter bytes.
///
/// Valid UTF-8 (with or without a BOM) is borrowed as-is. Otherwise the
/// encoding named in the XML declaration is used, and Windows-1252 when
/// there is none.
///
/// ```
/// use pagemark::util::decode_chapter;
///
/// assert_eq!(decode_chapter(b"<p>caf\xc3\xa9</p>"), "<p>caf\u{e9}</p>");
/// assert_eq!(decode_chapter(b"<p>caf\xe9</p>"), "<p>caf\u{e9}</p>");
/// ```
pub fn decode_chapter(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, declared_encoding(bytes))
}

/// Decode `bytes`, trying UTF-8, then `hint`, then Windows-1252.
pub fn decode_text<'a>(bytes: &'a [u8], hint: Option<&str>) -> Cow<'a, str> {
    let (text, _, malformed) = UTF_8.decode(bytes);
    if !malformed {
        return text;
    }

    let encoding = hint
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(WINDOWS_1252);
    let (text, _, _) = encoding.decode(bytes);
    text
}

/// The `encoding` pseudo-attribute of a leading XML declaration.
pub fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let start = memmem::find(window, b"<?xml")?;
    let declaration = &window[start..];
    let declaration = &declaration[..memmem::find(declaration, b"?>").unwrap_or(declaration.len())];

    let key = declaration
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"encoding"))?;
    let rest = declaration[key + 8..].trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();

    let (&quote, value) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = memchr::memchr(quote, value)?;
    std::str::from_utf8(&value[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_encoding() {
        assert_eq!(
            declared_encoding(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><html/>"),
            Some("ISO-8859-1")
        );
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding = 'utf-8' ?>"),
            Some("utf-8")
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><p>encoding=\"x\"</p>"), None);
        assert_eq!(declared_encoding(b"<html></html>"), None);
    }

    #[test]
    fn test_decode_prefers_utf8() {
        let text = decode_text("caf\u{e9}".as_bytes(), Some("iso-8859-2"));
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn test_decode_uses_declared_encoding() {
        // 0xB9 is s-caron in ISO-8859-2 and superscript one in Windows-1252.
        let bytes = b"<?xml version=\"1.0\" encoding=\"iso-8859-2\"?><p>\xb9</p>";
        assert!(decode_chapter(bytes).ends_with("<p>\u{161}</p>"));
    }

    #[test]
    fn test_decode_strips_bom() {
        assert_eq!(decode_chapter(b"\xef\xbb\xbf<p>x</p>"), "<p>x</p>");
    }
}
