//! Markdown extensions that run outside pulldown-cmark.
//!
//! Block extensions are line-based preprocessors over the raw Markdown;
//! the rest hook into the event walk in [`MarkdownRenderer`](crate::MarkdownRenderer).

mod blocks;
mod emoji;
mod fences;
mod tabbed;

pub(crate) use blocks::{BlockKind, BlockPreprocessor};
pub(crate) use emoji::replace_shortcodes;
pub use fences::CustomFenceProcessor;
pub(crate) use tabbed::TabbedPreprocessor;
