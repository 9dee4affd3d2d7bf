//! Emoji shortcode expansion (`:rocket:` → 🚀).

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z0-9_+\-]+):").unwrap());

/// Replace recognized `:name:` shortcodes with their emoji.
///
/// Unknown names stay in the text exactly as written, and their closing
/// colon may still open the next shortcode (`ab:cd:rocket:`).
pub fn resolve(text: &str) -> String {
    if !text.contains(':') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(found) = SHORTCODE.find_at(text, pos) {
        let name = &text[found.start() + 1..found.end() - 1];
        match emojis::get_by_shortcode(name) {
            Some(emoji) => {
                out.push_str(&text[pos..found.start()]);
                out.push_str(emoji.as_str());
                pos = found.end();
            }
            None => {
                // Clock times and ratios (`10:30:45`) are not shortcodes.
                if name.chars().any(char::is_alphabetic) {
                    warn!(shortcode = %name, "Unknown emoji shortcode left as is");
                }
                out.push_str(&text[pos..found.end() - 1]);
                pos = found.end() - 1;
            }
        }
    }
    out.push_str(&text[pos..]);
    out
}
