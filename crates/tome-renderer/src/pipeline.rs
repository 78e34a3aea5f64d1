//! Ordered extension pipeline: block preprocessors, then the event renderer.

use crate::backend::LinkContext;
use crate::extensions::{BlockKind, BlockPreprocessor, CustomFenceProcessor, TabbedPreprocessor};
use crate::highlight::{AnnotationError, check_fences};
use crate::html::HtmlBackend;
use crate::options::{Extension, MarkdownOptions};
use crate::renderer::{MarkdownRenderer, RenderResult};

/// Renders Markdown documents with a fixed set of extensions.
///
/// Stages always run in [`Extension`] order: admonitions, details and tabs
/// rewrite the source text, then pulldown-cmark events are rendered with the
/// remaining extensions. One pipeline is shared by every page of a build.
#[derive(Clone, Debug, Default)]
pub struct MarkdownPipeline {
    options: MarkdownOptions,
}

impl MarkdownPipeline {
    #[must_use]
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Apply the enabled block preprocessors.
    #[must_use]
    pub fn preprocess(&self, markdown: &str) -> String {
        let mut text = markdown.to_owned();
        if self.options.is_enabled(Extension::Admonition) {
            text = BlockPreprocessor::new(BlockKind::Admonition).process(&text);
        }
        if self.options.is_enabled(Extension::Details) {
            text = BlockPreprocessor::new(BlockKind::Details).process(&text);
        }
        if self.options.is_enabled(Extension::Tabbed) {
            text = TabbedPreprocessor::new().process(&text);
        }
        text
    }

    /// Render a document body (front-matter already removed).
    ///
    /// The first H1 is extracted as the title. `context` enables rewriting of
    /// relative links to published URLs.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotationError`] when a code block carries an invalid
    /// `hl_lines` or `linenums` annotation. Lines count from the start of
    /// `markdown`.
    pub fn render(
        &self,
        markdown: &str,
        context: Option<&LinkContext>,
    ) -> Result<RenderResult, AnnotationError> {
        if self.options.is_enabled(Extension::Highlight) {
            check_fences(markdown, self.options.highlight.linenums)?;
        }

        let text = self.preprocess(markdown);

        let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
            .with_options(self.options.clone())
            .with_title_extraction();
        if let Some(context) = context {
            renderer = renderer.with_link_context(context.clone());
        }
        let custom_fences = &self.options.superfences.custom_fences;
        if self.options.is_enabled(Extension::SuperFences) && !custom_fences.is_empty() {
            renderer = renderer.with_processor(CustomFenceProcessor::new(custom_fences.clone()));
        }

        Ok(renderer.render_markdown(&text))
    }
}
