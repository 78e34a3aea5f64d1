//! Markdown renderer with an ordered extension pipeline.
//!
//! [`MarkdownPipeline`] is the entry point used by the site builder: it runs
//! the block preprocessors (admonitions, details, tabs) over the source text
//! and hands the result to a generic [`MarkdownRenderer`].
//!
//! # Architecture
//!
//! The renderer walks pulldown-cmark events and delegates format-specific
//! elements (code blocks, blockquotes, images, links) to a [`RenderBackend`].
//! [`HtmlBackend`] produces HTML5 and rewrites relative `.md` links to
//! published page URLs.
//!
//! # Example
//!
//! ```
//! use tome_renderer::{MarkdownOptions, MarkdownPipeline};
//!
//! let pipeline = MarkdownPipeline::new(MarkdownOptions::all());
//! let result = pipeline
//!     .render("# Hello\n\n!!! tip\n    **Bold** text\n", None)
//!     .unwrap();
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! assert!(result.html.contains(r#"<div class="admonition tip">"#));
//! ```

mod backend;
mod code_block;
mod extensions;
mod fence;
mod highlight;
mod html;
mod options;
mod pipeline;
mod renderer;
mod state;
mod util;

pub use backend::{CodeBlock, LinkContext, RenderBackend};
pub use code_block::{CodeBlockProcessor, ProcessResult};
pub use extensions::CustomFenceProcessor;
pub use highlight::AnnotationError;
pub use html::HtmlBackend;
pub use options::{
    CustomFence, Extension, HighlightOptions, MarkdownOptions, Permalink, SuperFencesOptions,
    TaskListOptions, TocOptions,
};
pub use pipeline::MarkdownPipeline;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
pub use util::{is_markdown, output_path, page_url, relative_path, resolve_relative};
