//! Render backend trait for format-specific rendering.
//!
//! The generic renderer handles shared structure (lists, tables, inline
//! formatting); the backend decides how code blocks, blockquotes, images and
//! links are emitted.

use std::borrow::Cow;
use std::fmt::Write;

/// Location of the page being rendered, used to rewrite relative links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkContext {
    /// Source path relative to the content root (`php/arrays.md`).
    pub source: String,
    /// Whether pages are published as `page/index.html`.
    pub directory_urls: bool,
}

impl LinkContext {
    /// Create a link context for a source path.
    #[must_use]
    pub fn new(source: impl Into<String>, directory_urls: bool) -> Self {
        Self {
            source: source.into(),
            directory_urls,
        }
    }
}

/// Code block passed to [`RenderBackend::code_block`].
pub struct CodeBlock<'a> {
    /// Language identifier (e.g. `rust`).
    pub lang: Option<&'a str>,
    /// Raw code.
    pub content: &'a str,
}

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a plain code block (no highlight annotations).
    fn code_block(block: &CodeBlock<'_>, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render an image.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Transform a link or image URL.
    ///
    /// Default implementation returns the URL unchanged.
    #[must_use]
    fn transform_link<'a>(url: &'a str, _context: Option<&LinkContext>) -> Cow<'a, str> {
        Cow::Borrowed(url)
    }

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    ///
    /// `custom` selects the styled checkbox markup, `clickable` leaves the
    /// input enabled.
    fn task_list_marker(checked: bool, custom: bool, clickable: bool, out: &mut String) {
        let checked = if checked { " checked" } else { "" };
        let disabled = if clickable { "" } else { " disabled" };
        if custom {
            out.push_str(r#"<label class="task-list-control">"#);
            write!(out, r#"<input type="checkbox"{checked}{disabled}>"#).unwrap();
            out.push_str(r#"<span class="task-list-indicator"></span></label> "#);
        } else {
            write!(out, r#"<input type="checkbox"{checked}{disabled}> "#).unwrap();
        }
    }
}
