//! Span-level emphasis: bold, italic, strikethrough, underline, links.
//!
//! One ordered rule table per dialect. Rules run strictly in table order and
//! each one sees the output of the previous, so a marker consumed by a higher
//! precedence rule is gone before a lower one looks for its own. Every
//! delimiter match is guarded:
//!
//! - the delimiter may not touch another copy of its marker character, so the
//!   leftovers of `***` or `**` never start a new span;
//! - content must start and end with non-whitespace and stay on one line;
//! - content must not cut through a tag synthesized by an earlier rule;
//! - underscore and single-tilde delimiters may not sit inside a word
//!   (`snake_case_name`, `a~b~c`).
//!
//! Link targets (`](url)`) are set aside before the emphasis rules run, so
//! markers inside a url never turn into tags. A candidate that fails a guard
//! is left as literal text. Nothing here can fail.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::escape::escape_attr;
use super::types::Dialect;
use super::vault::{Vault, is_private_use};

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]\n]+)\]\(([^()\s<>]+)\)").unwrap());
static LINK_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\([^()\s<>]+\)").unwrap());

/// A paired-delimiter emphasis rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimited {
    pub marker: &'static str,
    pub open: &'static str,
    pub close: &'static str,
    /// Refuse delimiters flanked by word characters on the outside.
    pub word_bound: bool,
}

/// One entry of an inline rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineRule {
    Delimited(Delimited),
    Link,
}

const fn delimited(
    marker: &'static str,
    open: &'static str,
    close: &'static str,
    word_bound: bool,
) -> InlineRule {
    InlineRule::Delimited(Delimited {
        marker,
        open,
        close,
        word_bound,
    })
}

const BOLD_ITALIC: InlineRule = delimited("***", "<b><i>", "</i></b>", false);
const BOLD: InlineRule = delimited("**", "<b>", "</b>", false);
const UNDERLINE: InlineRule = delimited("__", "<u>", "</u>", true);
const ITALIC_STAR: InlineRule = delimited("*", "<i>", "</i>", false);
const ITALIC_UNDERSCORE: InlineRule = delimited("_", "<i>", "</i>", true);

/// Markdown and non-passthrough HTML.
pub const MARKDOWN_RULES: [InlineRule; 7] = [
    BOLD_ITALIC,
    BOLD,
    delimited("~~", "<s>", "</s>", false),
    UNDERLINE,
    ITALIC_STAR,
    ITALIC_UNDERSCORE,
    InlineRule::Link,
];

/// Modern marks strikethrough with a single tilde.
pub const MODERN_RULES: [InlineRule; 7] = [
    BOLD_ITALIC,
    BOLD,
    delimited("~", "<s>", "</s>", true),
    UNDERLINE,
    ITALIC_STAR,
    ITALIC_UNDERSCORE,
    InlineRule::Link,
];

/// Rule table for a dialect. Plain text synthesizes no tags.
pub fn rules_for(dialect: Dialect) -> &'static [InlineRule] {
    match dialect {
        Dialect::Markdown | Dialect::Html => &MARKDOWN_RULES,
        Dialect::Modern => &MODERN_RULES,
        Dialect::Plain => &[],
    }
}

/// Apply the dialect's rule table in precedence order.
pub fn transform(text: &str, dialect: Dialect) -> String {
    let rules = rules_for(dialect);
    if rules.is_empty() {
        return text.to_string();
    }

    let (text, targets) = Vault::extract(text, &LINK_TARGET);
    let text = rules.iter().fold(text, |acc, rule| match rule {
        InlineRule::Link => rule.apply(&targets.restore(&acc)),
        InlineRule::Delimited(_) => rule.apply(&acc),
    });
    targets.restore(&text)
}

impl InlineRule {
    pub fn apply(&self, text: &str) -> String {
        match self {
            InlineRule::Delimited(rule) => rule.replace_pairs(text, |inner| {
                format!("{}{inner}{}", rule.open, rule.close)
            }),
            InlineRule::Link => apply_links(text),
        }
    }
}

impl Delimited {
    /// Replace every guarded `marker … marker` pair with `wrap(content)`.
    pub fn replace_pairs<F>(&self, text: &str, wrap: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let bytes = text.as_bytes();
        let width = self.marker.len();
        if !text.contains(self.marker) {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut i = 0;

        while i + width <= bytes.len() {
            if bytes[i..].starts_with(self.marker.as_bytes()) && self.can_open(text, i) {
                if let Some(close) = self.find_close(text, i + width) {
                    out.push_str(&text[last..i]);
                    out.push_str(&wrap(&text[i + width..close]));
                    i = close + width;
                    last = i;
                    continue;
                }
            }
            i += 1;
        }

        out.push_str(&text[last..]);
        out
    }

    fn marker_byte(&self) -> u8 {
        self.marker.as_bytes()[0]
    }

    fn can_open(&self, text: &str, at: usize) -> bool {
        let bytes = text.as_bytes();
        let marker = self.marker_byte();
        let before = at.checked_sub(1).map(|p| bytes[p]);
        let Some(after) = bytes.get(at + self.marker.len()).copied() else {
            return false;
        };

        before != Some(marker)
            && after != marker
            && !after.is_ascii_whitespace()
            && !(self.word_bound && text[..at].chars().next_back().is_some_and(is_word_char))
    }

    fn can_close(&self, text: &str, at: usize) -> bool {
        let bytes = text.as_bytes();
        let marker = self.marker_byte();
        let before = bytes[at - 1];
        let after = bytes.get(at + self.marker.len()).copied();

        before != marker
            && !before.is_ascii_whitespace()
            && after != Some(marker)
            && !(self.word_bound
                && text[at + self.marker.len()..]
                    .chars()
                    .next()
                    .is_some_and(is_word_char))
    }

    /// Earliest valid closing delimiter for content starting at `from`.
    fn find_close(&self, text: &str, from: usize) -> Option<usize> {
        let bytes = text.as_bytes();
        let width = self.marker.len();
        let mut j = from + 1;

        while j + width <= bytes.len() {
            match bytes[j] {
                b'\n' => return None,
                _ if bytes[j..].starts_with(self.marker.as_bytes())
                    && self.can_close(text, j)
                    && tags_balanced(&text[from..j]) =>
                {
                    return Some(j);
                }
                _ => j += 1,
            }
        }
        None
    }
}

fn apply_links(text: &str) -> String {
    if !text.contains("](") {
        return text.to_string();
    }
    LINK.replace_all(text, |caps: &Captures| {
        let label = &caps[1];
        // A placeholder in the url would restore as markup inside `href`.
        if !tags_balanced(label) || caps[2].chars().any(is_private_use) {
            return caps[0].to_string();
        }
        format!("<a href=\"{}\">{label}</a>", escape_attr(&caps[2]))
    })
    .into_owned()
}

/// Letters and digits in any script. Placeholder codepoints are not words.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// True when every tag opened in `fragment` is also closed in it, in order.
///
/// All `<` in the working text come from synthesized tags (user input was
/// escaped first), so a plain scan is enough.
pub(crate) fn tags_balanced(fragment: &str) -> bool {
    let mut stack: Vec<&str> = Vec::new();
    let mut rest = fragment;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            return false;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            if stack.pop() != Some(name) {
                return false;
            }
        } else {
            stack.push(tag.split_whitespace().next().unwrap_or(""));
        }
    }
    stack.is_empty()
}
