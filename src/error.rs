//! Error types for the post formatter.
//!
//! The conversion engine itself is total and never returns these; they are
//! raised by the glue around it (configuration loading, size limits, the
//! transport's verdict on a rendered post).

/// Errors surfaced while turning an authored message into a deliverable post.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Conversion failed: {0}")]
    ConversionFailure(String),

    #[error("Message too long: {length} characters, {max} allowed")]
    SizeLimitExceeded { length: usize, max: usize },

    #[error("Transport rejected the formatted message: {reason}. Fix the markup and resend")]
    Rejected { reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FormatError {
    /// Whether the author can fix the message and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FormatError::Rejected { .. })
    }

    /// Classify an error description returned by the chat transport.
    pub fn from_transport(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("can't parse entities")
            || lower.contains("unsupported start tag")
            || lower.contains("can't find end tag")
            || lower.contains("unclosed")
            || lower.contains("too long")
        {
            FormatError::Rejected {
                reason: description.to_string(),
            }
        } else {
            FormatError::Transport(description.to_string())
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown message format: {0}")]
    UnknownDialect(String),
}

/// Result type alias for the formatter.
pub type Result<T> = std::result::Result<T, FormatError>;
