//! Line-oriented structures: lists, tables, quotes, headings, rules.
//!
//! The destination format has no list, table, heading or block-quote
//! elements, so everything here degrades to flat lines (optionally wrapped in
//! whitelisted emphasis tags). Runs on already-escaped text, which is why the
//! quote marker is recognized in its `&gt;` form.
//!
//! ```text
//!            list item            table row            quote line
//!   NORMAL ─────────────▶ LIST   ──────────▶ TABLE   ─────────────▶ QUOTE
//!     ▲                    │                   │                     │
//!     └──── any other line / end of input flushes the open buffer ───┘
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::escape::display_width;
use super::types::Dialect;

/// Literal line that replaces a horizontal rule.
pub const SEPARATOR: &str = "— — — — — — — — — —";

const QUOTE_MARKER: &str = "&gt;";

static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d{1,9})[.)]\s+(.+)$").unwrap());
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.+)$").unwrap());
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").unwrap());
static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

/// Degrade all block structures in `text` to flat lines.
pub fn transform(text: &str, dialect: Dialect) -> String {
    transform_measured(text, dialect, display_width)
}

/// [`transform`], padding table columns by `width` of each cell.
///
/// The pipeline measures cells as they will finally render, so code
/// placeholders and emphasis markers do not skew the columns.
pub fn transform_measured<W>(text: &str, dialect: Dialect, width: W) -> String
where
    W: Fn(&str) -> usize,
{
    let mut machine = BlockMachine::new(dialect, &width);
    for line in text.split('\n') {
        machine.feed(line);
    }
    machine.finish()
}

// ── Line classification ─────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Unordered { indent: &'a str, content: &'a str },
    Ordered { indent: &'a str, number: u32, content: &'a str },
    TableRow(&'a str),
    Quote(&'a str),
    Heading { level: usize, content: &'a str },
    Rule,
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();

    if RULE.is_match(line) {
        return Line::Rule;
    }
    if trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|') {
        return Line::TableRow(trimmed);
    }
    if let Some(rest) = line.trim_start().strip_prefix(QUOTE_MARKER) {
        let mut content = rest;
        while let Some(inner) = content.trim_start().strip_prefix(QUOTE_MARKER) {
            content = inner;
        }
        return Line::Quote(content.trim());
    }
    if let Some(caps) = HEADING.captures(line) {
        let (Some(hashes), Some(content)) = (caps.get(1), caps.get(2)) else {
            return Line::Text(line);
        };
        return Line::Heading {
            level: hashes.as_str().len(),
            content: content.as_str(),
        };
    }
    if let Some(caps) = ORDERED_ITEM.captures(line) {
        let (Some(indent), Some(number), Some(content)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            return Line::Text(line);
        };
        if let Ok(number) = number.as_str().parse() {
            return Line::Ordered {
                indent: indent.as_str(),
                number,
                content: content.as_str(),
            };
        }
    }
    if let Some(caps) = UNORDERED_ITEM.captures(line) {
        let (Some(indent), Some(content)) = (caps.get(1), caps.get(2)) else {
            return Line::Text(line);
        };
        return Line::Unordered {
            indent: indent.as_str(),
            content: content.as_str(),
        };
    }
    Line::Text(line)
}

// ── State machine ───────────────────────────────────────────────────

#[derive(Debug, Default)]
enum State {
    #[default]
    Normal,
    UnorderedList {
        indent: usize,
    },
    OrderedList {
        indent: usize,
        next: u32,
    },
    Table(TableBuffer),
    Quote(Vec<String>),
}

struct BlockMachine<'w> {
    dialect: Dialect,
    width: &'w dyn Fn(&str) -> usize,
    state: State,
    out: Vec<String>,
}

impl<'w> BlockMachine<'w> {
    fn new(dialect: Dialect, width: &'w dyn Fn(&str) -> usize) -> Self {
        Self {
            dialect,
            width,
            state: State::Normal,
            out: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        match classify(line) {
            Line::Unordered { indent, content } => {
                let continues = matches!(
                    self.state,
                    State::UnorderedList { indent: open } if open == indent.len()
                );
                if !continues {
                    self.flush();
                    self.state = State::UnorderedList {
                        indent: indent.len(),
                    };
                }
                self.out.push(format!("{indent}• {content}"));
            }
            Line::Ordered {
                indent,
                number,
                content,
            } => {
                let number = match self.state {
                    State::OrderedList { indent: open, next } if open == indent.len() => next,
                    _ => {
                        self.flush();
                        number
                    }
                };
                self.state = State::OrderedList {
                    indent: indent.len(),
                    next: number.saturating_add(1),
                };
                self.out.push(format!("{indent}{number}. {content}"));
            }
            Line::TableRow(row) => {
                if let State::Table(table) = &mut self.state {
                    table.push(row);
                } else {
                    self.flush();
                    let mut table = TableBuffer::default();
                    table.push(row);
                    self.state = State::Table(table);
                }
            }
            Line::Quote(content) => {
                if let State::Quote(parts) = &mut self.state {
                    parts.push(content.to_string());
                } else {
                    self.flush();
                    self.state = State::Quote(vec![content.to_string()]);
                }
            }
            Line::Heading { level, content } => {
                self.flush();
                self.out.push(render_heading(level, content));
            }
            Line::Rule => {
                self.flush();
                self.out.push(SEPARATOR.to_string());
            }
            Line::Text(text) => {
                self.flush();
                self.out.push(text.to_string());
            }
        }
    }

    /// Close whatever structure is open, emitting buffered output.
    fn flush(&mut self) {
        match std::mem::take(&mut self.state) {
            State::Table(table) => {
                let lines = table.render(self.width);
                self.out.extend(lines);
            }
            State::Quote(parts) => self.out.push(render_quote(&parts, self.dialect)),
            State::Normal | State::UnorderedList { .. } | State::OrderedList { .. } => {}
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out.join("\n")
    }
}

// ── Renderers ───────────────────────────────────────────────────────

fn render_heading(level: usize, content: &str) -> String {
    match level {
        1 => format!("<b><u>{content}</u></b>"),
        2 => format!("<b>{content}</b>"),
        _ => format!("<b><i>{content}</i></b>"),
    }
}

fn render_quote(parts: &[String], dialect: Dialect) -> String {
    let joined = parts
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return String::new();
    }
    match dialect {
        Dialect::Modern => format!("│ <i>{joined}</i>"),
        Dialect::Markdown | Dialect::Html | Dialect::Plain => format!("<i>{joined}</i>"),
    }
}

#[derive(Debug, Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    header_rule: bool,
}

impl TableBuffer {
    fn push(&mut self, row: &str) {
        let cells = split_cells(row);
        if is_separator_row(&cells) {
            if self.rows.len() == 1 {
                self.header_rule = true;
            }
            return;
        }
        self.rows.push(cells);
    }

    fn render(self, width_of: &dyn Fn(&str) -> usize) -> Vec<String> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in &self.rows {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(width_of(cell));
            }
        }

        let rule_width = widths.iter().sum::<usize>() + 3 * columns.saturating_sub(1);
        let mut lines = Vec::with_capacity(self.rows.len() + 1);

        for (index, row) in self.rows.iter().enumerate() {
            let line = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let cell = row.get(col).map(String::as_str).unwrap_or("");
                    let pad = width.saturating_sub(width_of(cell));
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ");
            lines.push(line.trim_end().to_string());

            if index == 0 && self.header_rule {
                lines.push("-".repeat(rule_width));
            }
        }
        lines
    }
}

fn split_cells(row: &str) -> Vec<String> {
    let inner = row.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            !cell.is_empty() && cell.contains('-') && cell.chars().all(|c| c == '-' || c == ':')
        })
}
