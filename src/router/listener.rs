use serde::{Deserialize, Serialize};

/// A click listener installed in the page for all elements matching a selector.
///
/// The page script reports a click by navigating to
/// `<scheme_name>://<attribute value>/clientX=<x>&clientY=<y>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassListenerConfig {
    pub scheme_name: String,
    pub query_selector: String,
    pub attribute_name: String,
    #[serde(default = "default_select_all")]
    pub select_all: bool,
}

fn default_select_all() -> bool {
    true
}

impl ClassListenerConfig {
    pub fn new(
        scheme_name: impl Into<String>,
        query_selector: impl Into<String>,
        attribute_name: impl Into<String>,
    ) -> Self {
        Self {
            scheme_name: scheme_name.into(),
            query_selector: query_selector.into(),
            attribute_name: attribute_name.into(),
            select_all: true,
        }
    }

    /// Script call that installs this listener in a loaded page.
    pub fn registration_script(&self) -> String {
        format!(
            "addClassBasedOnClickListener({}, {}, {}, {});",
            js_string(&self.scheme_name),
            js_string(&self.query_selector),
            js_string(&self.attribute_name),
            self.select_all
        )
    }
}

/// Quote `s` as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '<' => out.push_str("\\x3c"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_script() {
        let listener = ClassListenerConfig::new("footnote", "a.noteref", "href");
        assert_eq!(
            listener.registration_script(),
            r#"addClassBasedOnClickListener("footnote", "a.noteref", "href", true);"#
        );
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(js_string("x\ny"), r#""x\ny""#);
        assert_eq!(js_string("</script>"), r#""\x3c/script>""#);
        assert_eq!(js_string("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn test_deserialize_defaults_select_all() {
        let listener: ClassListenerConfig = toml::from_str(
            "scheme_name = \"footnote\"\nquery_selector = \".fn\"\nattribute_name = \"id\"\n",
        )
        .unwrap();
        assert!(listener.select_all);
    }
}
