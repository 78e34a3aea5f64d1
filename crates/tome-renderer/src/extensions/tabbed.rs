//! Content tabs preprocessor (`=== "Label"`).
//!
//! Consecutive tabs form one tab set. `===!` forces a new set and `===+`
//! selects the tab. Output follows the radio-input layout used by the theme
//! stylesheet:
//!
//! ```text
//! <div class="tabbed-set tabbed-alternate" data-tabs="1:2">
//! <input checked="checked" id="__tabbed_1_1" name="__tabbed_1" type="radio">
//! <input id="__tabbed_1_2" name="__tabbed_1" type="radio">
//! <div class="tabbed-labels"><label for="__tabbed_1_1">PHP</label>...</div>
//! <div class="tabbed-content">
//! <div class="tabbed-block">
//! ...
//! ```

use std::fmt::Write;

use super::blocks::{body_end, push_line};
use crate::fence::FenceTracker;
use crate::state::escape_html;
use crate::util::{dedent, indent_width};

struct TabMarker {
    label: String,
    select: bool,
    new_set: bool,
}

struct Tab {
    label: String,
    select: bool,
    body: String,
}

/// Tabs preprocessor. Set ids are unique within one document.
#[derive(Default)]
pub(crate) struct TabbedPreprocessor {
    next_set: usize,
}

impl TabbedPreprocessor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Process markdown text and return the transformed output.
    pub(crate) fn process(&mut self, input: &str) -> String {
        let lines: Vec<&str> = input.lines().collect();
        let mut output = String::with_capacity(input.len() + 256);
        self.process_lines(&lines, &mut output);
        output
    }

    fn process_lines(&mut self, lines: &[&str], out: &mut String) {
        let mut fence = FenceTracker::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            fence.update(line);
            if fence.in_fence() || parse_marker(line.trim_start()).is_none() {
                push_line(out, line);
                i += 1;
                continue;
            }

            let indent = &line[..line.len() - line.trim_start().len()];
            self.next_set += 1;
            let set = self.next_set;
            let (tabs, end) = self.collect_set(lines, i, indent);
            emit(set, &tabs, indent, out);
            i = end;
        }
    }

    /// Collect consecutive tabs at the same indent starting at `start`.
    fn collect_set(&mut self, lines: &[&str], start: usize, indent: &str) -> (Vec<Tab>, usize) {
        let body_indent = indent_width(indent) + 4;
        let mut tabs = Vec::new();
        let mut i = start;

        while let Some(marker) = lines
            .get(i)
            .filter(|line| line.starts_with(indent) && indent_width(line) == indent_width(indent))
            .and_then(|line| parse_marker(line.trim_start()))
        {
            if marker.new_set && !tabs.is_empty() {
                break;
            }

            let end = body_end(lines, i + 1, body_indent);
            let body: Vec<&str> = lines[i + 1..end]
                .iter()
                .map(|l| dedent(l, body_indent))
                .collect();
            let mut inner = String::new();
            self.process_lines(&body, &mut inner);
            tabs.push(Tab {
                label: marker.label,
                select: marker.select,
                body: inner,
            });

            // Blank lines between tabs keep the set together.
            i = end;
            let next = lines[i..]
                .iter()
                .position(|l| !l.trim().is_empty())
                .map_or(lines.len(), |offset| i + offset);
            if lines
                .get(next)
                .is_some_and(|l| parse_marker(l.trim_start()).is_some())
            {
                i = next;
            } else {
                break;
            }
        }

        (tabs, i)
    }
}

fn emit(set: usize, tabs: &[Tab], indent: &str, out: &mut String) {
    let selected = tabs.iter().position(|t| t.select).unwrap_or(0);

    writeln!(
        out,
        r#"{indent}<div class="tabbed-set tabbed-alternate" data-tabs="{set}:{}">"#,
        tabs.len()
    )
    .unwrap();
    for n in 1..=tabs.len() {
        let checked = if n - 1 == selected {
            r#"checked="checked" "#
        } else {
            ""
        };
        writeln!(
            out,
            r#"{indent}<input {checked}id="__tabbed_{set}_{n}" name="__tabbed_{set}" type="radio">"#
        )
        .unwrap();
    }
    write!(out, r#"{indent}<div class="tabbed-labels">"#).unwrap();
    for (n, tab) in (1..).zip(tabs) {
        write!(
            out,
            r#"<label for="__tabbed_{set}_{n}">{}</label>"#,
            escape_html(&tab.label)
        )
        .unwrap();
    }
    out.push_str("</div>\n");
    writeln!(out, r#"{indent}<div class="tabbed-content">"#).unwrap();

    for (k, tab) in tabs.iter().enumerate() {
        if k > 0 {
            writeln!(out, "{indent}</div>").unwrap();
        }
        writeln!(out, r#"{indent}<div class="tabbed-block">"#).unwrap();
        out.push('\n');
        for line in tab.body.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                push_line(out, &format!("{indent}{line}"));
            }
        }
        out.push('\n');
    }

    for _ in 0..3 {
        writeln!(out, "{indent}</div>").unwrap();
    }
    out.push('\n');
}

fn parse_marker(trimmed: &str) -> Option<TabMarker> {
    let rest = trimmed.strip_prefix("===")?;
    let (rest, select, new_set) = match rest.chars().next()? {
        '+' => (&rest[1..], true, false),
        '!' => (&rest[1..], false, true),
        _ => (rest, false, false),
    };
    let rest = rest.trim();
    let label = rest.strip_prefix('"')?.strip_suffix('"')?;
    Some(TabMarker {
        label: label.to_owned(),
        select,
        new_set,
    })
}
