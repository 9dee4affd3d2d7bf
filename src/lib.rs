//! Post formatter: turns authored channel posts into transport-ready rich text.

pub mod config;
pub mod error;
pub mod format;
pub mod post;
