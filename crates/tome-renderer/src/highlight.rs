//! Code block annotations: `title`, `linenums` and `hl_lines`.

use std::collections::HashMap;
use std::fmt::Write;

use crate::code_block::parse_fence_info;
use crate::fence::{FenceLine, FenceTracker};
use crate::state::escape_html;

/// Invalid code block annotation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct AnnotationError {
    /// 1-based line of the opening fence.
    pub line: usize,
    /// What was wrong.
    pub message: String,
}

/// Largest accepted `linenums` start.
const MAX_LINENUMS: usize = u32::MAX as usize;

/// Annotations parsed from a fence info string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CodeAnnotations {
    pub(crate) title: Option<String>,
    /// First line number, when lines are numbered.
    pub(crate) linenums: Option<usize>,
    /// Inclusive line ranges to highlight.
    pub(crate) hl_lines: Vec<(usize, usize)>,
}

impl CodeAnnotations {
    /// Parse annotations from fence attributes.
    ///
    /// `default_linenums` numbers lines from 1 unless `linenums` says otherwise.
    pub(crate) fn from_attrs(
        attrs: &HashMap<String, String>,
        default_linenums: bool,
    ) -> Result<Self, String> {
        let linenums = match attrs.get("linenums").map(String::as_str) {
            None => default_linenums.then_some(1),
            Some("" | "true") => Some(1),
            Some("false" | "0") => None,
            Some(value) => Some(
                value
                    .parse()
                    .ok()
                    .filter(|&n| n <= MAX_LINENUMS)
                    .ok_or_else(|| format!("invalid linenums `{value}`: expected a line number"))?,
            ),
        };

        let hl_lines = match attrs.get("hl_lines") {
            Some(spec) => parse_line_spec(spec)?,
            None => Vec::new(),
        };

        Ok(Self {
            title: attrs.get("title").filter(|t| !t.is_empty()).cloned(),
            linenums,
            hl_lines,
        })
    }

    fn is_highlighted(&self, line: usize) -> bool {
        self.hl_lines
            .iter()
            .any(|&(start, end)| (start..=end).contains(&line))
    }

    /// Write the highlighted block.
    pub(crate) fn render(&self, lang: Option<&str>, content: &str, out: &mut String) {
        match lang {
            Some(lang) => write!(
                out,
                r#"<div class="language-{} highlight">"#,
                escape_html(lang)
            )
            .unwrap(),
            None => out.push_str(r#"<div class="highlight">"#),
        }
        if let Some(title) = &self.title {
            write!(out, r#"<span class="filename">{}</span>"#, escape_html(title)).unwrap();
        }
        out.push_str("<pre><span></span><code>");

        let body = content.strip_suffix('\n').unwrap_or(content);
        for (i, line) in body.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let number = i + 1;
            let highlighted = self.is_highlighted(number);
            if highlighted {
                out.push_str(r#"<span class="hll">"#);
            }
            if let Some(start) = self.linenums {
                write!(
                    out,
                    r#"<span class="linenos" data-linenos="{} "></span>"#,
                    start.saturating_add(i)
                )
                .unwrap();
            }
            out.push_str(&escape_html(line));
            if highlighted {
                out.push_str("</span>");
            }
        }

        out.push_str("</code></pre></div>");
    }
}

/// Parse `"1 3-5"` into inclusive line ranges.
fn parse_line_spec(spec: &str) -> Result<Vec<(usize, usize)>, String> {
    let mut lines = Vec::new();
    for part in spec.split_whitespace() {
        let invalid = || format!("invalid hl_lines `{spec}`: expected numbers or ranges like `2-4`");
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.parse().map_err(|_| invalid())?;
                let end: usize = end.parse().map_err(|_| invalid())?;
                if start == 0 || end < start {
                    return Err(invalid());
                }
                lines.push((start, end));
            }
            None => {
                let line: usize = part.parse().map_err(|_| invalid())?;
                if line == 0 {
                    return Err(invalid());
                }
                lines.push((line, line));
            }
        }
    }
    Ok(lines)
}

/// Validate the annotations of every fence in a document.
///
/// Runs on the source text before any preprocessing so errors point at the
/// line the author wrote.
pub(crate) fn check_fences(markdown: &str, default_linenums: bool) -> Result<(), AnnotationError> {
    let mut fence = FenceTracker::new();
    for (idx, line) in markdown.lines().enumerate() {
        let FenceLine::Open(info) = fence.update(line) else {
            continue;
        };
        let (_, attrs) = parse_fence_info(info);
        CodeAnnotations::from_attrs(&attrs, default_linenums).map_err(|message| {
            AnnotationError {
                line: idx + 1,
                message,
            }
        })?;
    }
    Ok(())
}
