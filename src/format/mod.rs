//! Message formatting engine.
//!
//! Turns author text in one of four dialects into the HTML subset the chat
//! transport understands (`b`, `i`, `u`, `s`, `code`, `pre`, `a`), or into
//! plain text. Every entry point here is a pure function of its input.

pub mod blocks;
pub mod emoji;
pub mod entities;
pub mod escape;
pub mod footer;
pub mod inline;
pub mod pipeline;
pub mod types;
pub mod vault;

pub use entities::reconstruct_markup;
pub use escape::{ALLOWED_TAGS, is_passthrough};
pub use footer::{compose_footer, compose_post};
pub use pipeline::convert;
pub use types::{Dialect, FooterLink, FooterSlot, Span, SpanKind};
