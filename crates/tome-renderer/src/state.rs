//! State structs tracked while walking Markdown events.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Alignment style attribute for the current cell.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Completed heading, ready to be written.
pub(crate) struct Heading {
    pub(crate) level: u8,
    pub(crate) id: String,
    pub(crate) html: String,
}

/// State for tracking headings, anchor ids and title extraction.
pub(crate) struct HeadingState {
    extract_title: bool,
    title: Option<String>,
    current_level: Option<u8>,
    /// Plain text of the current heading (table of contents and slug).
    text: String,
    /// HTML of the current heading (with inline formatting).
    html: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            title: None,
            current_level: None,
            text: String::new(),
            html: String::new(),
            toc: Vec::new(),
            id_counts: HashMap::new(),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub(crate) fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Complete the current heading and record its table of contents entry.
    ///
    /// The first H1 becomes the page title (when extraction is enabled) and is
    /// left out of the table of contents, but is still rendered.
    pub(crate) fn complete_heading(&mut self) -> Option<Heading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.generate_id(&text);

        let is_title = self.extract_title && level == 1 && self.title.is_none();
        if is_title {
            self.title = Some(text.trim().to_owned());
        } else {
            self.toc.push(TocEntry {
                level,
                title: text.trim().to_owned(),
                id: id.clone(),
            });
        }

        Some(Heading {
            level,
            id,
            html: html.trim().to_owned(),
        })
    }

    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id.push_str("section");
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    /// Take table of contents entries up to `max_level`.
    pub(crate) fn take_toc(&mut self, max_level: u8) -> Vec<TocEntry> {
        let mut toc = std::mem::take(&mut self.toc);
        toc.retain(|entry| entry.level <= max_level);
        toc
    }
}

/// Footnote references and definitions collected during a render.
///
/// Definitions are rendered into their own buffer and emitted after the body,
/// numbered in order of first reference.
#[derive(Default)]
pub(crate) struct FootnoteState {
    numbers: HashMap<String, usize>,
    order: Vec<String>,
    definitions: HashMap<String, String>,
    /// Label of the open definition and the body output it displaced.
    open: Option<(String, String)>,
}

impl FootnoteState {
    /// Number for a reference, assigned on first use.
    ///
    /// The flag is `true` for the first reference, which carries the anchor
    /// the back-link jumps to.
    pub(crate) fn reference(&mut self, label: &str) -> (usize, bool) {
        if let Some(&n) = self.numbers.get(label) {
            return (n, false);
        }
        let n = self.order.len() + 1;
        self.numbers.insert(label.to_owned(), n);
        self.order.push(label.to_owned());
        (n, true)
    }

    /// Redirect output into a definition buffer.
    pub(crate) fn start_definition(&mut self, label: &str, out: &mut String) {
        self.open = Some((label.to_owned(), std::mem::take(out)));
    }

    /// Restore body output and keep the definition.
    pub(crate) fn end_definition(&mut self, out: &mut String) {
        if let Some((label, body)) = self.open.take() {
            let definition = std::mem::replace(out, body);
            self.definitions.insert(label, definition);
        }
    }

    /// Append the footnote list for referenced definitions.
    pub(crate) fn render(&mut self, out: &mut String) {
        let referenced: Vec<(usize, String)> = self
            .order
            .iter()
            .enumerate()
            .filter_map(|(i, label)| Some((i + 1, self.definitions.remove(label)?)))
            .collect();
        if referenced.is_empty() {
            return;
        }

        out.push_str(r#"<div class="footnote"><hr><ol>"#);
        for (n, mut body) in referenced {
            let backref = format!(
                r##"<a class="footnote-backref" href="#fnref:{n}" title="Jump back to footnote {n} in the text">&#8617;</a>"##
            );
            if body.ends_with("</p>") {
                body.insert_str(body.len() - "</p>".len(), &format!("&nbsp;{backref}"));
            } else {
                body.push_str(&backref);
            }
            write!(out, r#"<li id="fn:{n}">{body}</li>"#).unwrap();
        }
        out.push_str("</ol></div>");
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("Массивы в PHP"), "массивы-в-php");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_table_state() {
        let mut state = TableState::default();
        state.start(vec![Alignment::Left, Alignment::Right]);
        state.start_head();
        assert!(state.is_in_head());
        assert_eq!(state.current_alignment_style(), r#" style="text-align:left""#);
        state.next_cell();
        assert_eq!(state.current_alignment_style(), r#" style="text-align:right""#);
        state.next_cell();
        assert_eq!(state.current_alignment_style(), "");
    }

    #[test]
    fn test_heading_state_title_excluded_from_toc() {
        let mut state = HeadingState::new(true);

        state.start_heading(1);
        state.push_text("Arrays");
        let heading = state.complete_heading().unwrap();
        assert_eq!(heading.level, 1);
        assert_eq!(heading.id, "arrays");

        state.start_heading(2);
        state.push_text("Sorting");
        state.complete_heading().unwrap();

        state.start_heading(4);
        state.push_text("Deep");
        state.complete_heading().unwrap();

        assert_eq!(state.take_title(), Some("Arrays".to_owned()));
        let toc = state.take_toc(3);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].id, "sorting");
    }

    #[test]
    fn test_heading_ids_unique() {
        let mut state = HeadingState::new(false);
        for _ in 0..3 {
            state.start_heading(2);
            state.push_text("FAQ");
            state.complete_heading();
        }
        let ids: Vec<_> = state.take_toc(6).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_heading_without_text_gets_id() {
        let mut state = HeadingState::new(false);
        state.start_heading(2);
        state.push_text("!!!");
        assert_eq!(state.complete_heading().unwrap().id, "section");
    }

    #[test]
    fn test_footnotes_numbered_by_reference() {
        let mut state = FootnoteState::default();
        let mut out = String::from("<p>body</p>");

        state.start_definition("b", &mut out);
        out.push_str("<p>second</p>");
        state.end_definition(&mut out);
        state.start_definition("a", &mut out);
        out.push_str("<p>first</p>");
        state.end_definition(&mut out);

        assert_eq!(state.reference("a"), (1, true));
        assert_eq!(state.reference("b"), (2, true));
        assert_eq!(state.reference("a"), (1, false));

        state.render(&mut out);
        assert!(out.starts_with("<p>body</p><div class=\"footnote\">"));
        let first = out.find("fn:1").unwrap();
        let second = out.find("fn:2").unwrap();
        assert!(first < second);
        assert!(out.contains("first&nbsp;<a class=\"footnote-backref\" href=\"#fnref:1\""));
    }

    #[test]
    fn test_footnotes_without_references_render_nothing() {
        let mut state = FootnoteState::default();
        let mut out = String::new();
        state.start_definition("x", &mut out);
        out.push_str("<p>orphan</p>");
        state.end_definition(&mut out);
        state.render(&mut out);
        assert_eq!(out, "");
    }
}
