//! Event-level Markdown rendering: pulldown-cmark events in, page HTML,
//! title, table of contents and search text out.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, TextMergeStream};

use crate::backend::{CodeBlock, LinkContext, RenderBackend};
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::extensions::replace_shortcodes;
use crate::highlight::CodeAnnotations;
use crate::options::{Extension, MarkdownOptions};
use crate::state::{
    CodeBlockState, FootnoteState, HeadingState, ImageState, TableState, TocEntry, escape_html,
};
use crate::util::heading_level_to_num;

/// Output of one page render.
#[derive(Clone, Debug, Default)]
pub struct RenderResult {
    /// Page body HTML.
    pub html: String,
    /// Text of the first H1, when title extraction is on.
    pub title: Option<String>,
    /// Headings below the title, limited by `toc_depth`.
    pub toc: Vec<TocEntry>,
    /// Plain text of the page, whitespace-separated, for the search index.
    pub text: String,
    /// Warnings generated during conversion (e.g. invalid code annotations).
    pub warnings: Vec<String>,
}

/// Streams pulldown-cmark events into HTML.
///
/// Block-level markup is written here; code blocks, breaks and rules go
/// through the [`RenderBackend`]. [`MarkdownOptions`] selects the event-level
/// extensions (highlighting, emoji, footnotes, task lists and the rest).
/// Fenced code can be claimed by [`with_processor`](Self::with_processor)
/// hooks before normal rendering.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    footnotes: FootnoteState,
    options: MarkdownOptions,
    link_context: Option<LinkContext>,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    pending_attrs: HashMap<String, String>,
    /// Output offsets of open `<li>` tags, for task list classes.
    items: Vec<usize>,
    text: String,
    warnings: Vec<String>,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a new renderer with every extension enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            footnotes: FootnoteState::default(),
            options: MarkdownOptions::all(),
            link_context: None,
            pending_image: None,
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
            items: Vec::new(),
            text: String::new(),
            warnings: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Report the first H1 as the page title.
    ///
    /// The H1 is still rendered but left out of the table of contents.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Replace the extension selection.
    #[must_use]
    pub fn with_options(mut self, options: MarkdownOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the page location used to rewrite relative links.
    #[must_use]
    pub fn with_link_context(mut self, context: LinkContext) -> Self {
        self.link_context = Some(context);
        self
    }

    /// Register a code block hook. Hooks run in registration order and the
    /// first one that does not pass the block through wins.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use tome_renderer::{CodeBlockProcessor, HtmlBackend, MarkdownRenderer, ProcessResult};
    ///
    /// struct Upper;
    ///
    /// impl CodeBlockProcessor for Upper {
    ///     fn process(
    ///         &mut self,
    ///         language: &str,
    ///         _attrs: &HashMap<String, String>,
    ///         source: &str,
    ///         _index: usize,
    ///     ) -> ProcessResult {
    ///         if language == "shout" {
    ///             ProcessResult::Inline(source.to_uppercase())
    ///         } else {
    ///             ProcessResult::PassThrough
    ///         }
    ///     }
    /// }
    ///
    /// let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_processor(Upper);
    /// let result = renderer.render_markdown("```shout\nhi\n```");
    /// assert_eq!(result.html, "HI\n");
    /// ```
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Parser options for the enabled extensions.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        for (ext, flag) in [
            (Extension::Tables, Options::ENABLE_TABLES),
            (Extension::TaskList, Options::ENABLE_TASKLISTS),
            (Extension::Footnotes, Options::ENABLE_FOOTNOTES),
            (Extension::DefList, Options::ENABLE_DEFINITION_LIST),
        ] {
            if self.options.is_enabled(ext) {
                options |= flag;
            }
        }
        options
    }

    /// Parse and render `markdown`.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, self.parser_options());
        self.render(TextMergeStream::new(parser))
    }

    /// Render an event stream, consuming the renderer's buffered state.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.footnotes.render(&mut self.output);

        let max_level = if self.options.is_enabled(Extension::Toc) {
            self.options.toc.toc_depth
        } else {
            6
        };
        let mut warnings = std::mem::take(&mut self.warnings);
        warnings.extend(self.processors.iter().flat_map(|p| p.warnings()).cloned());

        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            toc: self.heading.take_toc(max_level),
            text: std::mem::take(&mut self.text).trim_end().to_owned(),
            warnings,
        }
    }

    /// Inline markup goes to the heading buffer while inside a heading.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Separate the plain text of adjacent blocks.
    fn break_text(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.horizontal_rule(),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => {
                self.items.push(self.output.len());
                self.output.push_str("<li>");
            }
            Tag::FootnoteDefinition(label) => {
                self.footnotes.start_definition(&label, &mut self.output);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let href = B::transform_link(&dest_url, self.link_context.as_ref());
                let mut link_tag = format!(r#"<a href="{}""#, escape_html(&href));
                if !title.is_empty() {
                    write!(link_tag, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                link_tag.push('>');
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag.
                self.image.start();
                let src = B::transform_link(&dest_url, self.link_context.as_ref()).into_owned();
                self.pending_image = Some((src, title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("</p>");
                }
                self.break_text();
            }
            TagEnd::Heading(_) => {
                self.break_text();
                if let Some(heading) = self.heading.complete_heading() {
                    self.write_heading(heading.level, &heading.id, &heading.html);
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => {
                self.break_text();
                self.end_code_block();
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => {
                self.items.pop();
                self.output.push_str("</li>");
                self.break_text();
            }
            TagEnd::FootnoteDefinition => self.footnotes.end_definition(&mut self.output),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut html = String::new();
                    B::image(&src, &alt, &title, &mut html);
                    self.push_inline(&html);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => {
                self.output.push_str("</dt>");
                self.break_text();
            }
            TagEnd::DefinitionListDefinition => {
                self.output.push_str("</dd>");
                self.break_text();
            }
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
                self.break_text();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
    }

    fn write_heading(&mut self, level: u8, id: &str, html: &str) {
        write!(self.output, r#"<h{level} id="{id}">{html}"#).unwrap();
        if self.options.is_enabled(Extension::Toc)
            && let Some(symbol) = self.options.toc.permalink.symbol()
        {
            write!(
                self.output,
                r##"<a class="headerlink" href="#{id}" title="{}">{}</a>"##,
                escape_html(&self.options.toc.permalink_title),
                escape_html(symbol)
            )
            .unwrap();
        }
        write!(self.output, "</h{level}>").unwrap();
    }

    fn end_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);
        let index = self.code_block_index;
        self.code_block_index += 1;

        // Try processors in order, fall back to normal code block rendering
        let processed = lang.as_ref().is_some_and(|lang_str| {
            self.processors.iter_mut().any(|processor| {
                match processor.process(lang_str, &attrs, &content, index) {
                    ProcessResult::Inline(html) => {
                        self.output.push_str(&html);
                        true
                    }
                    ProcessResult::PassThrough => false,
                }
            })
        });
        if processed {
            return;
        }

        if self.options.is_enabled(Extension::Highlight) {
            let annotations = CodeAnnotations::from_attrs(&attrs, self.options.highlight.linenums)
                .unwrap_or_else(|message| {
                    self.warnings.push(message);
                    CodeAnnotations::default()
                });
            annotations.render(lang.as_deref(), &content, &mut self.output);
        } else {
            B::code_block(
                &CodeBlock {
                    lang: lang.as_deref(),
                    content: &content,
                },
                &mut self.output,
            );
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
            self.push_text(text);
            return;
        }
        if self.image.is_active() {
            self.image.push_str(text);
            return;
        }

        self.push_text(text);
        let html = if self.options.is_enabled(Extension::Emoji) {
            replace_shortcodes(text)
        } else {
            escape_html(text)
        };
        if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&html);
        } else {
            self.output.push_str(&html);
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }

        let (class, code) = match code.strip_prefix("#!") {
            Some(rest) if self.options.is_enabled(Extension::InlineHilite) => {
                let (lang, body) = rest.split_once(' ').unwrap_or((rest, ""));
                (
                    format!(r#" class="language-{} highlight""#, escape_html(lang)),
                    body,
                )
            }
            _ => (String::new(), code),
        };

        self.push_text(code);
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code{class}>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn raw_html(&mut self, html: &str) {
        self.push_inline(html);
    }

    fn footnote_reference(&mut self, label: &str) {
        let (n, first) = self.footnotes.reference(label);
        let id = if first {
            format!(r#" id="fnref:{n}""#)
        } else {
            String::new()
        };
        let html =
            format!(r##"<sup{id}><a class="footnote-ref" href="#fn:{n}">{n}</a></sup>"##);
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else {
            self.push_inline("\n");
            self.break_text();
        }
    }

    fn hard_break(&mut self) {
        B::hard_break(&mut self.output);
        self.break_text();
    }

    fn horizontal_rule(&mut self) {
        B::horizontal_rule(&mut self.output);
    }

    fn task_list_marker(&mut self, checked: bool) {
        if let Some(&start) = self.items.last() {
            // `<li` is always the first thing written for an item.
            self.output
                .insert_str(start + "<li".len(), r#" class="task-list-item""#);
        }
        B::task_list_marker(
            checked,
            self.options.tasklist.custom_checkbox,
            self.options.tasklist.clickable_checkbox,
            &mut self.output,
        );
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}
