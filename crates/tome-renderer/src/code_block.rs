//! Code block processor trait and fence info parsing.
//!
//! Processors are registered with the renderer and checked in order when a
//! fenced code block is encountered. The first processor returning a
//! non-`PassThrough` result wins.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use tome_renderer::{CodeBlockProcessor, ProcessResult};
//!
//! struct GraphvizProcessor;
//!
//! impl CodeBlockProcessor for GraphvizProcessor {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         _attrs: &HashMap<String, String>,
//!         source: &str,
//!         _index: usize,
//!     ) -> ProcessResult {
//!         if language == "dot" {
//!             ProcessResult::Inline(format!("<div class=\"graphviz\">{source}</div>"))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with HTML.
    Inline(String),
    /// Render as a regular code block.
    PassThrough,
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block and return the result.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from fence info string
    /// * `attrs` - Attributes parsed from fence (key=value pairs)
    /// * `source` - Raw content of the code block
    /// * `index` - Zero-based index of the block in the document
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Parse fence info string into language and attributes.
///
/// Accepted forms:
/// - `lang key=value key="quoted value"`
/// - `{ .lang key="value" }` (attribute list; the first `.class` is the language)
///
/// Flag attributes without a value (`linenums`) map to an empty string.
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let info = info.trim();
    let braced = info.starts_with('{') && info.ends_with('}');
    let body = if braced { &info[1..info.len() - 1] } else { info };

    let mut language = String::new();
    let mut attrs = HashMap::new();

    for (index, token) in split_tokens(body).into_iter().enumerate() {
        if let Some((key, value)) = token.split_once('=') {
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            attrs.insert(key.to_owned(), value.to_owned());
        } else if braced {
            if let Some(class) = token.strip_prefix('.') {
                if language.is_empty() {
                    language = class.to_owned();
                }
            }
        } else if index == 0 {
            language = token.to_owned();
        } else {
            attrs.insert(token.to_owned(), String::new());
        }
    }

    (language, attrs)
}

/// Split on whitespace, keeping quoted segments together.
fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut quote = None;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            (None, c) if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    tokens.push(&input[s..i]);
                }
            }
            (None, _) => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&input[s..]);
    }
    tokens
}
