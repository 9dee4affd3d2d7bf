//! Per-dialect conversion pipeline.
//!
//! Rich dialects (Markdown, Modern, non-passthrough Html) run:
//! 1. extract fenced code, then inline code, into vaults
//! 2. escape `&`, `<`, `>` (the only escaping pass)
//! 3. expand emoji shortcodes
//! 4. degrade block structures
//! 5. apply the inline rule table
//! 6. restore inline code, then fenced code, rendered and escaped
//! 7. collapse runs of blank lines, trim
//!
//! Plain strips markup delimiters instead and never synthesizes a tag.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::blocks;
use super::emoji;
use super::escape::{escape_html, is_passthrough, visible_width};
use super::inline::{self, Delimited};
use super::types::Dialect;
use super::vault::Vault;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:([A-Za-z0-9_+#.\-]*)\n)?(.*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").unwrap());
static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Delimiters removed by the plain dialect, longest first.
const PLAIN_DELIMITERS: [&str; 7] = ["***", "**", "__", "~~", "*", "_", "`"];

/// Upper bound on plain strip passes; real input settles in two or three.
const PLAIN_MAX_PASSES: usize = 16;

/// Convert authored text into output for the transport.
///
/// Total: any input yields a string, malformed markup degrades to literal
/// characters.
pub fn convert(text: &str, dialect: Dialect) -> String {
    debug!(%dialect, input = %preview(text), "Converting message");

    let output = match dialect {
        Dialect::Plain => convert_plain(text),
        Dialect::Html if is_passthrough(text) => {
            debug!("Whitelisted tags found, forwarding HTML unmodified");
            text.to_string()
        }
        Dialect::Markdown | Dialect::Html => convert_rich(text, dialect),
        Dialect::Modern => {
            let body = convert_rich(text, dialect);
            if body.is_empty() {
                body
            } else {
                format!("{body}\n\n")
            }
        }
    };

    debug!(%dialect, output = %preview(&output), "Conversion finished");
    output
}

fn convert_rich(text: &str, dialect: Dialect) -> String {
    let (text, fences) = Vault::extract(text, &FENCED_CODE);
    let (text, spans) = Vault::extract(&text, &INLINE_CODE);
    debug!(
        fenced = fences.len(),
        inline = spans.len(),
        "Protected code regions"
    );

    let text = escape_html(&text);
    let text = emoji::resolve(&text);
    let cell_width = |cell: &str| {
        let rendered = spans.restore_with(&inline::transform(cell, dialect), render_inline_code);
        visible_width(&fences.restore_with(&rendered, render_fenced_code))
    };
    let text = blocks::transform_measured(&text, dialect, cell_width);
    debug!(text = %preview(&text), "After block transform");
    let text = inline::transform(&text, dialect);
    debug!(text = %preview(&text), "After inline transform");

    let text = spans.restore_with(&text, render_inline_code);
    let text = fences.restore_with(&text, render_fenced_code);

    normalize(&text)
}

fn render_inline_code(fragment: &str) -> String {
    let inner = fragment
        .strip_prefix('`')
        .and_then(|f| f.strip_suffix('`'))
        .unwrap_or(fragment);
    format!("<code>{}</code>", escape_html(inner))
}

fn render_fenced_code(fragment: &str) -> String {
    let Some(caps) = FENCED_CODE.captures(fragment) else {
        return escape_html(fragment);
    };
    let body = caps.get(2).map_or("", |m| m.as_str());
    let body = escape_html(body.strip_suffix('\n').unwrap_or(body));

    match caps.get(1).map(|m| m.as_str()).filter(|lang| !lang.is_empty()) {
        Some(lang) => format!("<pre><code class=\"language-{lang}\">{body}</code></pre>"),
        None => format!("<pre>{body}</pre>"),
    }
}

// ── Plain ───────────────────────────────────────────────────────────

fn convert_plain(text: &str) -> String {
    let mut current = normalize(text);
    for _ in 0..PLAIN_MAX_PASSES {
        let next = normalize(&strip_markup(&emoji::resolve(&current)));
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Delete paired delimiter characters, keeping what they enclose.
fn strip_markup(text: &str) -> String {
    let text = FENCED_CODE.replace_all(text, |caps: &Captures| {
        let body = caps.get(2).map_or("", |m| m.as_str());
        body.strip_suffix('\n').unwrap_or(body).to_string()
    });

    PLAIN_DELIMITERS
        .iter()
        .fold(text.into_owned(), |acc, &marker| {
            let rule = Delimited {
                marker,
                open: "",
                close: "",
                word_bound: marker == "_" || marker == "__",
            };
            rule.replace_pairs(&acc, str::to_string)
        })
}

// ── Helpers ─────────────────────────────────────────────────────────

fn normalize(text: &str) -> String {
    EXCESS_BLANK_LINES
        .replace_all(text, "\n\n")
        .trim()
        .to_string()
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
