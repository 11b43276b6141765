//! The `<variant-test>` placeholder element.
//!
//! Server-side rendering emits a placeholder element carrying the test
//! descriptor as attributes; the bucketing controller consumes it and the
//! whole element is replaced by the selected markup. This module holds the
//! in-crate representation of that element, the attribute escaping rules,
//! and a scanner that locates placeholders inside a rendered page string.

use std::collections::HashMap;

/// Tag name of the placeholder element.
pub const PLACEHOLDER_TAG: &str = "variant-test";

/// Attribute naming the currently active test type. Empty means no test.
pub const ATTR_TYPE: &str = "data-type";

/// Attribute carrying the traffic percentage (integer string, 0-100).
pub const ATTR_TRAFFIC: &str = "traffic-percentage";

/// Attribute carrying the JSON-encoded control markup.
pub const ATTR_CONTROL: &str = "control";

/// Attribute carrying the JSON-encoded variant markup.
pub const ATTR_VARIANT: &str = "variant";

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

/// A parsed placeholder element: attribute bag plus fallback inner HTML.
///
/// The fallback is the control markup rendered inline for user agents that
/// never run the controller; the controller itself reads only attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholder {
    attributes: HashMap<String, String>,
    fallback: String,
}

impl Placeholder {
    pub fn new() -> Self {
        Placeholder::default()
    }

    /// Builder-style attribute setter, used heavily in tests.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback = fallback.to_string();
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

// ---------------------------------------------------------------------------
// Attribute escaping
// ---------------------------------------------------------------------------

/// Escape a value for use inside a double-quoted HTML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_attr`]. `&amp;` is decoded last so escaped entities
/// inside the original value survive a round trip.
pub fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Page scanning
// ---------------------------------------------------------------------------

/// A placeholder located inside a page string, with the byte span the
/// replacement output must splice over.
#[derive(Debug, Clone)]
pub struct FoundPlaceholder {
    /// Byte offset of `<` of the opening tag.
    pub start: usize,
    /// Byte offset one past `>` of the closing tag.
    pub end: usize,
    pub element: Placeholder,
}

/// Locate the first complete `<variant-test …>…</variant-test>` element at
/// or after byte offset `from`. Returns `None` when no complete element
/// remains.
pub fn find_placeholder(html: &str, from: usize) -> Option<FoundPlaceholder> {
    let open = format!("<{}", PLACEHOLDER_TAG);
    let close = format!("</{}>", PLACEHOLDER_TAG);
    let mut search_from = from;

    loop {
        let start = search_from + html.get(search_from..)?.find(&open)?;
        let after_name = start + open.len();

        // Require a real tag boundary so e.g. `<variant-tests>` never matches.
        match html[after_name..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }

        let tag_close = after_name + html[after_name..].find('>')?;
        let attrs_raw = &html[after_name..tag_close];
        let content_start = tag_close + 1;
        let close_at = content_start + html[content_start..].find(&close)?;
        let end = close_at + close.len();

        let element = Placeholder {
            attributes: parse_attributes(attrs_raw),
            fallback: html[content_start..close_at].trim().to_string(),
        };
        return Some(FoundPlaceholder { start, end, element });
    }
}

/// Parse `name="value"` pairs from the inside of an opening tag. Values are
/// attribute-unescaped. Anything that does not fit the double-quoted form is
/// skipped; the rendering side only ever emits that form.
fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut rest = raw.trim_start();

    while !rest.is_empty() {
        let eq = match rest.find('=') {
            Some(i) => i,
            None => break,
        };
        let name = rest[..eq].trim();
        rest = rest[eq + 1..].trim_start();
        if !rest.starts_with('"') {
            break;
        }
        rest = &rest[1..];
        let end_quote = match rest.find('"') {
            Some(i) => i,
            None => break,
        };
        if !name.is_empty() {
            attrs.insert(name.to_string(), unescape_attr(&rest[..end_quote]));
        }
        rest = rest[end_quote + 1..].trim_start();
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- escaping -----------------------------------------------------------

    #[test]
    fn test_escape_attr_all_specials() {
        assert_eq!(
            escape_attr(r#"<a href="x">&'b'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#039;b&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_unescape_roundtrip() {
        let original = r#"{"html":"<p class=\"x\">5 > 4 & 3 < 4</p>"}"#;
        assert_eq!(unescape_attr(&escape_attr(original)), original);
    }

    #[test]
    fn test_unescape_amp_decoded_last() {
        // "&amp;quot;" must become "&quot;" (literal), not a double-decode to '"'.
        assert_eq!(unescape_attr("&amp;quot;"), "&quot;");
    }

    #[test]
    fn test_escape_attr_plain_text_untouched() {
        assert_eq!(escape_attr("plain text 123"), "plain text 123");
    }

    // -- placeholder scanning ----------------------------------------------

    #[test]
    fn test_find_placeholder_parses_attributes_and_fallback() {
        let html = r#"<main><variant-test data-type="hero" traffic-percentage="30" control="&quot;c&quot;" variant="&quot;v&quot;">
        fallback</variant-test></main>"#;
        let found = find_placeholder(html, 0).expect("placeholder not found");
        let el = &found.element;
        assert_eq!(el.attr(ATTR_TYPE), Some("hero"));
        assert_eq!(el.attr(ATTR_TRAFFIC), Some("30"));
        assert_eq!(el.attr(ATTR_CONTROL), Some("\"c\""));
        assert_eq!(el.attr(ATTR_VARIANT), Some("\"v\""));
        assert_eq!(el.fallback(), "fallback");
        assert_eq!(&html[found.start..found.start + 13], "<variant-test");
        assert!(html[..found.end].ends_with("</variant-test>"));
    }

    #[test]
    fn test_find_placeholder_none_in_plain_page() {
        assert!(find_placeholder("<main><p>no tests here</p></main>", 0).is_none());
    }

    #[test]
    fn test_find_placeholder_skips_similar_tag_names() {
        let html = r#"<variant-tests x="1"></variant-tests><variant-test data-type="t"></variant-test>"#;
        let found = find_placeholder(html, 0).expect("real placeholder not found");
        assert_eq!(found.element.attr(ATTR_TYPE), Some("t"));
    }

    #[test]
    fn test_find_placeholder_respects_from_offset() {
        let html = r#"<variant-test data-type="one"></variant-test><variant-test data-type="two"></variant-test>"#;
        let first = find_placeholder(html, 0).unwrap();
        let second = find_placeholder(html, first.end).unwrap();
        assert_eq!(first.element.attr(ATTR_TYPE), Some("one"));
        assert_eq!(second.element.attr(ATTR_TYPE), Some("two"));
    }

    #[test]
    fn test_find_placeholder_unterminated_element_is_none() {
        assert!(find_placeholder(r#"<variant-test data-type="x">dangling"#, 0).is_none());
    }

    #[test]
    fn test_parse_attributes_empty_value() {
        let html = r#"<variant-test data-type=""></variant-test>"#;
        let found = find_placeholder(html, 0).unwrap();
        assert_eq!(found.element.attr(ATTR_TYPE), Some(""));
    }
}
