//! Post rendering service used by the bot handlers.
//!
//! Wraps the pure engine with the current configuration snapshot: picks the
//! dialect, attaches the footer and enforces the transport size limit.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ConfigHandle;
use crate::error::{FormatError, Result};
use crate::format::{Dialect, Span, compose_post, reconstruct_markup};

/// A post ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPost {
    pub text: String,
    pub dialect: Dialect,
    /// Value for the transport's `parse_mode`; `None` sends plain text.
    pub parse_mode: Option<&'static str>,
}

impl RenderedPost {
    /// Request body for the transport's `sendMessage` call.
    pub fn send_message_body(&self, chat_id: &str) -> serde_json::Value {
        match self.parse_mode {
            Some(mode) => serde_json::json!({
                "chat_id": chat_id,
                "text": self.text,
                "parse_mode": mode,
            }),
            None => serde_json::json!({
                "chat_id": chat_id,
                "text": self.text,
            }),
        }
    }
}

/// Renders authored messages into deliverable posts.
#[derive(Debug, Clone)]
pub struct PostRenderer {
    config: ConfigHandle,
}

impl PostRenderer {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Render `text` in `dialect`, or the configured default.
    pub fn render(&self, text: &str, dialect: Option<Dialect>) -> Result<RenderedPost> {
        let config = self.config.snapshot();
        let dialect = dialect.unwrap_or(config.default_dialect);

        let text = compose_post(text, &config.footer_links, dialect);
        let length = text.chars().count();
        if length > config.max_message_len {
            warn!(%dialect, length, max = config.max_message_len, "Rendered post over size limit");
            return Err(FormatError::SizeLimitExceeded {
                length,
                max: config.max_message_len,
            });
        }

        debug!(%dialect, length, "Post rendered");
        Ok(RenderedPost {
            text,
            dialect,
            parse_mode: dialect.parse_mode(),
        })
    }

    /// Render an edited message whose formatting arrived as spans.
    pub fn render_edit(
        &self,
        text: &str,
        spans: &[Span],
        dialect: Option<Dialect>,
    ) -> Result<RenderedPost> {
        let dialect = dialect.unwrap_or(self.config.snapshot().default_dialect);
        let markup = reconstruct_markup(text, spans, dialect);
        debug!(%dialect, spans = spans.len(), "Reconstructed markup for edit");
        self.render(&markup, Some(dialect))
    }

    /// [`render`](Self::render) on the blocking pool, for large messages.
    pub async fn render_offloaded(
        &self,
        text: String,
        dialect: Option<Dialect>,
    ) -> Result<RenderedPost> {
        let renderer = self.clone();
        tokio::task::spawn_blocking(move || renderer.render(&text, dialect))
            .await
            .map_err(|e| FormatError::ConversionFailure(e.to_string()))?
    }
}
