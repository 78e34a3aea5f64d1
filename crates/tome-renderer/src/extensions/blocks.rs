//! Admonition (`!!!`) and collapsible details (`???`) preprocessors.
//!
//! Both turn an indented block into HTML wrapper tags separated from the body
//! by blank lines, so pulldown-cmark passes the tags through and still parses
//! the body as Markdown:
//!
//! ```text
//! !!! warning "Mind the gap"          <div class="admonition warning">
//!     Body text.              →       <p class="admonition-title">Mind the gap</p>
//!
//!                                     Body text.
//!
//!                                     </div>
//! ```
//!
//! Bodies are processed recursively, so blocks nest.

use std::fmt::Write;

use crate::fence::FenceTracker;
use crate::state::escape_html;
use crate::util::{dedent, indent_width};

/// Which marker a [`BlockPreprocessor`] handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// `!!! type "title"` → `<div class="admonition type">`.
    Admonition,
    /// `??? type "title"` / `???+` → `<details class="type">`.
    Details,
}

/// Parsed block opening line.
struct Marker {
    classes: Vec<String>,
    /// `None` when the title was explicitly empty (`""`).
    title: Option<String>,
    open: bool,
}

/// Line-based preprocessor for one block kind.
pub(crate) struct BlockPreprocessor {
    kind: BlockKind,
}

impl BlockPreprocessor {
    pub(crate) fn new(kind: BlockKind) -> Self {
        Self { kind }
    }

    /// Process markdown text and return the transformed output.
    pub(crate) fn process(&self, input: &str) -> String {
        let lines: Vec<&str> = input.lines().collect();
        let mut output = String::with_capacity(input.len() + 128);
        self.process_lines(&lines, &mut output);
        output
    }

    fn process_lines(&self, lines: &[&str], out: &mut String) {
        let mut fence = FenceTracker::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            fence.update(line);
            if fence.in_fence() {
                push_line(out, line);
                i += 1;
                continue;
            }

            let Some(marker) = self.parse_marker(line.trim_start()) else {
                push_line(out, line);
                i += 1;
                continue;
            };

            let indent = &line[..line.len() - line.trim_start().len()];
            let body_indent = indent_width(indent) + 4;
            let end = body_end(lines, i + 1, body_indent);
            let body: Vec<&str> = lines[i + 1..end]
                .iter()
                .map(|l| dedent(l, body_indent))
                .collect();

            let mut inner = String::new();
            self.process_lines(&body, &mut inner);
            self.emit(&marker, indent, &inner, out);
            i = end;
        }
    }

    fn parse_marker(&self, trimmed: &str) -> Option<Marker> {
        let (rest, open) = match self.kind {
            BlockKind::Admonition => (trimmed.strip_prefix("!!!")?, false),
            BlockKind::Details => match trimmed.strip_prefix("???+") {
                Some(rest) => (rest, true),
                None => (trimmed.strip_prefix("???")?, false),
            },
        };
        if !rest.starts_with([' ', '\t']) {
            return None;
        }

        let (types, title) = match rest.find('"') {
            Some(start) => {
                let quoted = &rest[start + 1..];
                let end = quoted.rfind('"')?;
                (&rest[..start], Some(&quoted[..end]))
            }
            None => (rest, None),
        };

        let classes: Vec<String> = types
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let first = classes.first()?;
        let title = match title {
            Some("") => None,
            Some(title) => Some(title.to_owned()),
            None => Some(capitalize(first)),
        };

        Some(Marker {
            classes,
            title,
            open,
        })
    }

    fn emit(&self, marker: &Marker, indent: &str, body: &str, out: &mut String) {
        let classes = escape_html(&marker.classes.join(" "));
        match self.kind {
            BlockKind::Admonition => {
                writeln!(out, r#"{indent}<div class="admonition {classes}">"#).unwrap();
                if let Some(title) = &marker.title {
                    writeln!(
                        out,
                        r#"{indent}<p class="admonition-title">{}</p>"#,
                        escape_html(title)
                    )
                    .unwrap();
                }
            }
            BlockKind::Details => {
                let open = if marker.open { " open" } else { "" };
                writeln!(out, r#"{indent}<details class="{classes}"{open}>"#).unwrap();
                let summary = marker
                    .title
                    .clone()
                    .unwrap_or_else(|| capitalize(&marker.classes[0]));
                writeln!(out, "{indent}<summary>{}</summary>", escape_html(&summary)).unwrap();
            }
        }

        out.push('\n');
        for line in body.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                push_line(out, &format!("{indent}{line}"));
            }
        }
        out.push('\n');

        let close = match self.kind {
            BlockKind::Admonition => "</div>",
            BlockKind::Details => "</details>",
        };
        writeln!(out, "{indent}{close}").unwrap();
        out.push('\n');
    }
}

/// Index one past the last body line.
///
/// The body is every following line that is blank or indented at least
/// `min_indent` columns; trailing blank lines are left outside.
pub(crate) fn body_end(lines: &[&str], start: usize, min_indent: usize) -> usize {
    let mut end = start;
    for (offset, line) in lines[start..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if indent_width(line) < min_indent {
            break;
        }
        end = start + offset + 1;
    }
    end
}

pub(crate) fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn admonition(input: &str) -> String {
        BlockPreprocessor::new(BlockKind::Admonition).process(input)
    }

    fn details(input: &str) -> String {
        BlockPreprocessor::new(BlockKind::Details).process(input)
    }

    #[test]
    fn test_admonition_with_title() {
        let output = admonition("!!! warning \"Mind the gap\"\n    Body text.\n");
        assert_eq!(
            output,
            "<div class=\"admonition warning\">\n<p class=\"admonition-title\">Mind the gap</p>\n\nBody text.\n\n</div>\n\n"
        );
    }

    #[test]
    fn test_admonition_default_title() {
        let output = admonition("!!! note\n    Text\n");
        assert!(output.contains(r#"<p class="admonition-title">Note</p>"#));
    }

    #[test]
    fn test_admonition_empty_title() {
        let output = admonition("!!! tip \"\"\n    Text\n");
        assert!(output.contains(r#"<div class="admonition tip">"#));
        assert!(!output.contains("admonition-title"));
    }

    #[test]
    fn test_admonition_extra_classes() {
        let output = admonition("!!! info inline end \"Side\"\n    Text\n");
        assert!(output.contains(r#"<div class="admonition info inline end">"#));
    }

    #[test]
    fn test_body_ends_at_dedent() {
        let output = admonition("!!! note\n    Inside\n\n    Still inside\n\nOutside\n");
        let close = output.find("</div>").unwrap();
        assert!(output[..close].contains("Still inside"));
        assert!(output[close..].contains("Outside"));
    }

    #[test]
    fn test_nested_admonitions() {
        let output = admonition("!!! note\n    Outer\n\n    !!! danger\n        Inner\n");
        assert!(output.contains(r#"<div class="admonition note">"#));
        assert!(output.contains(r#"<div class="admonition danger">"#));
        assert_eq!(output.matches("</div>").count(), 2);
    }

    #[test]
    fn test_indented_marker_keeps_indent() {
        let output = admonition("- item\n\n    !!! note\n        In list\n");
        assert!(output.contains("    <div class=\"admonition note\">\n"));
        assert!(output.contains("    In list\n"));
    }

    #[test]
    fn test_marker_inside_fence_untouched() {
        let input = "```md\n!!! note\n    Not a block\n```\n";
        assert_eq!(admonition(input), input);
    }

    #[test]
    fn test_fence_inside_body() {
        let output = admonition("!!! example\n    ```php\n    echo 1;\n    ```\n");
        assert!(output.contains("\n```php\necho 1;\n```\n"));
    }

    #[test]
    fn test_marker_requires_space() {
        let input = "!!!important\n";
        assert_eq!(admonition(input), input);
    }

    #[test]
    fn test_details_collapsed_and_open() {
        let closed = details("??? question \"Why?\"\n    Because.\n");
        assert!(closed.contains(r#"<details class="question">"#));
        assert!(closed.contains("<summary>Why?</summary>"));

        let open = details("???+ note\n    Shown.\n");
        assert!(open.contains(r#"<details class="note" open>"#));
        assert!(open.contains("<summary>Note</summary>"));
    }

    #[test]
    fn test_details_ignores_admonition_marker() {
        let input = "!!! note\n    Body\n";
        assert_eq!(details(input), input);
    }

    #[test]
    fn test_title_escaped() {
        let output = admonition("!!! note \"<script>\"\n    x\n");
        assert!(output.contains("&lt;script&gt;"));
    }
}
