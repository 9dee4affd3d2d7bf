//! Configuration types.
//!
//! A [`FormatterConfig`] is an immutable snapshot. Runtime changes (an admin
//! switching the default format) go through [`ConfigHandle`], which publishes
//! a fresh snapshot instead of touching the one conversions already hold.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::format::{Dialect, FooterLink, FooterSlot};

/// Transport limit for one text message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[(.*?)\]\((.*?)\)").unwrap());

/// Formatter configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Dialect used when a message does not name one.
    pub default_dialect: Dialect,
    /// Footer links appended to every post.
    pub footer_links: Vec<FooterLink>,
    /// Longest rendered post the transport accepts.
    pub max_message_len: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::Markdown,
            footer_links: Vec::new(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl FormatterConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// `DEFAULT_FORMAT` falls back to markdown with a warning when it names
    /// an unknown format. `MAX_MESSAGE_LENGTH` must be a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_dialect = match lookup("DEFAULT_FORMAT") {
            Some(raw) if !raw.trim().is_empty() => raw.parse().unwrap_or_else(|_| {
                warn!(format = %raw, "Unknown message format, using markdown");
                Dialect::Markdown
            }),
            _ => Dialect::Markdown,
        };

        let footer_links = [
            (FooterSlot::MainBot, "MAIN_BOT_LINK"),
            (FooterSlot::SupportBot, "SUPPORT_BOT_LINK"),
            (FooterSlot::Channel, "CHANNEL_LINK"),
        ]
        .into_iter()
        .filter_map(|(slot, key)| {
            let (label, url) = parse_markdown_link(&lookup(key)?);
            (!url.is_empty()).then(|| FooterLink::new(slot, label, url))
        })
        .collect();

        let max_message_len = match lookup("MAX_MESSAGE_LENGTH") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_MESSAGE_LENGTH".to_string(),
                        message: format!("expected a positive integer, got {raw:?}"),
                    });
                }
            },
            None => DEFAULT_MAX_MESSAGE_LEN,
        };

        Ok(Self {
            default_dialect,
            footer_links,
            max_message_len,
        })
    }
}

/// Split `[label](url)` into its parts. Anything else is taken as a bare url
/// with no label.
pub fn parse_markdown_link(raw: &str) -> (String, String) {
    match MARKDOWN_LINK.captures(raw) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
        None => (String::new(), raw.trim().to_string()),
    }
}

// ── Snapshot publishing ─────────────────────────────────────────────

/// Shared handle to the current configuration snapshot.
///
/// Cloning the handle is cheap; all clones see the same published snapshots.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<FormatterConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: FormatterConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<FormatterConfig> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replace the current snapshot.
    pub fn publish(&self, config: FormatterConfig) {
        self.tx.send_replace(Arc::new(config));
    }

    /// Publish a copy of the current snapshot with a new default dialect.
    pub fn set_default_dialect(&self, dialect: Dialect) {
        let mut next = (*self.snapshot()).clone();
        next.default_dialect = dialect;
        self.publish(next);
        info!(%dialect, "Default message format changed");
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FormatterConfig>> {
        self.tx.subscribe()
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(FormatterConfig::default())
    }
}
