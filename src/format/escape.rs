//! HTML escaping and passthrough detection.

use std::sync::LazyLock;

use regex::Regex;

/// Tags the transport accepts. Nothing else may ever be emitted.
pub const ALLOWED_TAGS: [&str; 7] = ["b", "i", "u", "s", "code", "pre", "a"];

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());
static WHITELISTED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:b|i|u|s|code|pre|a)(?:\s[^<>]*)?>").unwrap());

/// True when the text already contains at least one whitelisted tag, i.e. the
/// author hand-wrote rich text and it should be forwarded untouched.
pub fn is_passthrough(text: &str) -> bool {
    WHITELISTED_TAG.is_match(text)
}

/// Escape `&`, `<` and `>` to their entity forms.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value placed inside a double-quoted attribute.
///
/// `text` must already be HTML-escaped; only the quote is left to handle.
pub fn escape_attr(text: &str) -> String {
    text.replace('"', "&quot;")
}

/// Visible width of escaped text: each entity counts as one character.
pub fn display_width(text: &str) -> usize {
    let mut width = 0;
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let skip = ["&amp;", "&lt;", "&gt;", "&quot;"]
            .iter()
            .find(|entity| rest.starts_with(**entity))
            .map_or(c.len_utf8(), |entity| entity.len());
        rest = &rest[skip..];
        width += 1;
    }
    width
}

/// Visible width of rendered output: tags take no room, entities count once.
pub fn visible_width(html: &str) -> usize {
    display_width(&ANY_TAG.replace_all(html, ""))
}
