//! Shared types for the formatting engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ── Dialect ─────────────────────────────────────────────────────────

/// Markup style the author wrote the message in.
///
/// Selects which rule table and escaping policy the pipeline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Markdown,
    Modern,
    Html,
    Plain,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Markdown,
        Dialect::Modern,
        Dialect::Html,
        Dialect::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Markdown => "markdown",
            Dialect::Modern => "modern",
            Dialect::Html => "html",
            Dialect::Plain => "plain",
        }
    }

    /// Parse mode the transport must be told to use for converted output.
    ///
    /// Every rich dialect is converted to the same tag whitelist, so they all
    /// ship as HTML; plain output is raw text.
    pub fn parse_mode(&self) -> Option<&'static str> {
        match self {
            Dialect::Markdown | Dialect::Modern | Dialect::Html => Some("HTML"),
            Dialect::Plain => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" => Ok(Dialect::Markdown),
            "modern" => Ok(Dialect::Modern),
            "html" => Ok(Dialect::Html),
            "plain" => Ok(Dialect::Plain),
            other => Err(ConfigError::UnknownDialect(other.to_string())),
        }
    }
}

// ── Spans ───────────────────────────────────────────────────────────

/// Style of a transport-supplied span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Bold,
    Italic,
    Code,
    Pre,
    #[serde(rename = "text_link")]
    Link,
    Strikethrough,
    Underline,
    /// Mentions, hashtags, spoilers and anything else we cannot re-express.
    #[serde(other)]
    Unsupported,
}

/// A styled region of a message, as reported by the transport.
///
/// Offsets and lengths count Unicode codepoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "type")]
    pub kind: SpanKind,
    pub offset: usize,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Code language for `pre` spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Span {
    pub fn new(kind: SpanKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            language: None,
        }
    }

    pub fn link(offset: usize, length: usize, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(SpanKind::Link, offset, length)
        }
    }

    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

// ── Footer links ────────────────────────────────────────────────────

/// Position of a footer link. Footers are always rendered in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterSlot {
    MainBot,
    SupportBot,
    Channel,
}

/// A promotional link appended to every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub slot: FooterSlot,
    pub label: String,
    pub url: String,
}

impl FooterLink {
    pub fn new(slot: FooterSlot, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            slot,
            label: label.into(),
            url: url.into(),
        }
    }

    /// Text shown for the link; falls back to the url when no label is set.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.url
        } else {
            &self.label
        }
    }
}
