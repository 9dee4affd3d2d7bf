//! Rebuild dialect markup from transport style spans (message editing).
//!
//! Spans are applied in descending start order, so inserting delimiters
//! around one span never moves the start of a span still waiting. The text is
//! held as one piece per codepoint, so span offsets index it directly; every
//! delimiter becomes one extra piece, and a span's end is shifted by the
//! delimiters already placed before it. That also keeps nested spans (a bold
//! run containing an italic word) correct.

use tracing::debug;

use super::escape::{escape_attr, escape_html};
use super::types::{Dialect, Span, SpanKind};

#[derive(Debug, Clone, Copy)]
struct Placed {
    pos: usize,
    is_close: bool,
}

/// Re-insert `dialect` delimiters around each span of `text`.
///
/// Unsupported kinds, empty or out-of-range spans and links without a url
/// are skipped.
pub fn reconstruct_markup(text: &str, spans: &[Span], dialect: Dialect) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut ordered = merge_touching(
        spans
            .iter()
            .filter_map(|span| normalize_span(span, &chars, dialect))
            .collect(),
    );
    ordered.sort_by(|a, b| b.offset.cmp(&a.offset).then(a.length.cmp(&b.length)));

    let mut pieces: Vec<String> = chars
        .iter()
        .map(|c| match dialect {
            Dialect::Html => escape_html(c.encode_utf8(&mut [0; 4])),
            _ => c.to_string(),
        })
        .collect();
    let mut placed: Vec<Placed> = Vec::with_capacity(ordered.len() * 2);

    for (index, span) in ordered.iter().enumerate() {
        let italic = italic_marker(index, &ordered, &chars);
        let Some((open, close)) = delimiters(span, dialect, italic) else {
            debug!(kind = ?span.kind, offset = span.offset, "Span has no markup in this dialect, skipped");
            continue;
        };

        let end = span.end();
        let shift = placed
            .iter()
            .filter(|p| p.pos < end || (p.pos == end && p.is_close))
            .count();
        pieces.insert(end + shift, close);
        // Every span placed so far starts at or after this one, so nothing
        // sits before `offset` yet.
        pieces.insert(span.offset, open);

        placed.push(Placed {
            pos: end,
            is_close: true,
        });
        placed.push(Placed {
            pos: span.offset,
            is_close: false,
        });
    }

    if placed.is_empty() {
        // Nothing re-inserted: hand back the text exactly as received so the
        // pipeline escapes it once.
        return text.to_string();
    }
    pieces.concat()
}

/// Validate a span and, for emphasis kinds in delimiter dialects, pull its
/// edges in past whitespace so the closing delimiter is recognized later.
fn normalize_span(span: &Span, chars: &[char], dialect: Dialect) -> Option<Span> {
    if span.length == 0 || span.end() > chars.len() {
        debug!(
            offset = span.offset,
            length = span.length,
            text_len = chars.len(),
            "Span out of range, skipped"
        );
        return None;
    }
    if span.kind == SpanKind::Unsupported {
        debug!(offset = span.offset, "Unsupported span kind, skipped");
        return None;
    }
    if span.kind == SpanKind::Link && span.url.as_deref().is_none_or(str::is_empty) {
        debug!(offset = span.offset, "Link span without url, skipped");
        return None;
    }

    let trims_edges =
        matches!(dialect, Dialect::Markdown | Dialect::Modern) && is_emphasis(span.kind);
    if !trims_edges {
        return Some(span.clone());
    }

    let mut start = span.offset;
    let mut end = span.end();
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    (start < end).then(|| Span {
        offset: start,
        length: end - start,
        ..span.clone()
    })
}

fn is_emphasis(kind: SpanKind) -> bool {
    matches!(
        kind,
        SpanKind::Bold | SpanKind::Italic | SpanKind::Strikethrough | SpanKind::Underline
    )
}

/// Join emphasis spans of the same kind that overlap or touch, so the
/// delimiters of one never run straight into the other's.
fn merge_touching(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.length.cmp(&a.length)));
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        let same_run = merged.iter_mut().rev().find(|prev| {
            prev.kind == span.kind && is_emphasis(span.kind) && span.offset <= prev.end()
        });
        match same_run {
            Some(prev) => prev.length = prev.end().max(span.end()) - prev.offset,
            None => merged.push(span),
        }
    }
    merged
}

/// `_` reads better next to `**` but cannot sit against a letter, where
/// `*` is used instead. A neighbour that is itself the edge of another
/// emphasis span will be separated by that span's delimiter, so it does not
/// count as touching.
fn italic_marker(index: usize, spans: &[Span], chars: &[char]) -> &'static str {
    let span = &spans[index];
    let emphasis_edge_at = |pos: usize| {
        spans.iter().enumerate().any(|(other, s)| {
            other != index && is_emphasis(s.kind) && (s.offset == pos || s.end() == pos)
        })
    };
    let joins_word = |pos: usize, neighbour: Option<&char>| {
        neighbour.is_some_and(|c| c.is_alphanumeric()) && !emphasis_edge_at(pos)
    };

    let before = span.offset.checked_sub(1).and_then(|i| chars.get(i));
    if joins_word(span.offset, before) || joins_word(span.end(), chars.get(span.end())) {
        "*"
    } else {
        "_"
    }
}

fn delimiters(span: &Span, dialect: Dialect, italic: &str) -> Option<(String, String)> {
    let pair = |open: &str, close: &str| Some((open.to_string(), close.to_string()));

    match dialect {
        Dialect::Html => match span.kind {
            SpanKind::Bold => pair("<b>", "</b>"),
            SpanKind::Italic => pair("<i>", "</i>"),
            SpanKind::Underline => pair("<u>", "</u>"),
            SpanKind::Strikethrough => pair("<s>", "</s>"),
            SpanKind::Code => pair("<code>", "</code>"),
            SpanKind::Pre => match span.language.as_deref().filter(|l| !l.is_empty()) {
                Some(lang) => Some((
                    format!("<pre><code class=\"language-{}\">", escape_attr(&escape_html(lang))),
                    "</code></pre>".to_string(),
                )),
                None => pair("<pre>", "</pre>"),
            },
            SpanKind::Link => {
                let url = span.url.as_deref().filter(|u| !u.is_empty())?;
                Some((
                    format!("<a href=\"{}\">", escape_attr(&escape_html(url))),
                    "</a>".to_string(),
                ))
            }
            SpanKind::Unsupported => None,
        },
        Dialect::Markdown | Dialect::Modern => match span.kind {
            SpanKind::Bold => pair("**", "**"),
            SpanKind::Italic => pair(italic, italic),
            SpanKind::Underline => pair("__", "__"),
            SpanKind::Strikethrough if dialect == Dialect::Modern => pair("~", "~"),
            SpanKind::Strikethrough => pair("~~", "~~"),
            SpanKind::Code => pair("`", "`"),
            SpanKind::Pre => Some((
                format!("```{}\n", span.language.as_deref().unwrap_or("")),
                "\n```".to_string(),
            )),
            SpanKind::Link => {
                let url = span.url.as_deref().filter(|u| !u.is_empty())?;
                Some(("[".to_string(), format!("]({url})")))
            }
            SpanKind::Unsupported => None,
        },
        Dialect::Plain => match span.kind {
            SpanKind::Link => {
                let url = span.url.as_deref().filter(|u| !u.is_empty())?;
                Some((String::new(), format!(" ({url})")))
            }
            _ => None,
        },
    }
}
