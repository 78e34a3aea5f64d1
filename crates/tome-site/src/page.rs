//! Per-page rendering pipeline.
//!
//! A [`ContentPage`] moves through the stages in [`PageStage`] order. Each
//! transition consumes the page and returns it in the next stage, or a
//! [`RenderError`] recording where and in which stage it failed.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tome_renderer::{AnnotationError, LinkContext, MarkdownPipeline, TocEntry, output_path, page_url};

use crate::error::WriteError;
use crate::front_matter::{FrontMatter, FrontMatterError, parse_document};
use crate::resolver::{ResolvedPage, file_stem};

/// Last stage a page completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PageStage {
    Loaded,
    FrontMatterParsed,
    BodyRendered,
    TemplateApplied,
    Written,
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loaded => "load",
            Self::FrontMatterParsed => "front-matter",
            Self::BodyRendered => "render",
            Self::TemplateApplied => "template",
            Self::Written => "write",
        })
    }
}

/// Cause of a page failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderErrorKind {
    #[error("cannot read file: {0}")]
    Io(#[source] io::Error),
    #[error("file is not valid UTF-8")]
    InvalidUtf8,
    #[error(transparent)]
    FrontMatter(FrontMatterError),
    #[error("{0}")]
    Annotation(String),
}

/// A single page failed. Other pages are unaffected.
#[derive(Debug, thiserror::Error)]
#[error("{source_path}{}: {kind}", line.map_or_else(String::new, |l| format!(":{l}")))]
pub struct RenderError {
    /// Source path relative to the content root.
    pub source_path: String,
    /// 1-based line in the source file, when known.
    pub line: Option<usize>,
    /// Stage the page was in when it failed.
    pub stage: PageStage,
    #[source]
    pub kind: RenderErrorKind,
}

/// Content page and everything derived from it during a build.
#[derive(Clone, Debug)]
pub struct ContentPage {
    /// Source path relative to the content root.
    pub source: String,
    /// Absolute source path.
    pub path: PathBuf,
    /// Published URL without leading slash.
    pub url: String,
    /// Labels of the enclosing nav sections.
    pub sections: Vec<String>,
    /// Nav label, if declared.
    pub label: Option<String>,
    /// File contents.
    pub raw: String,
    pub front_matter: FrontMatter,
    body_start: usize,
    body_line: usize,
    /// Resolved page title.
    pub title: String,
    /// Rendered body.
    pub html: String,
    /// Whether the body opens its own H1.
    pub has_heading: bool,
    pub toc: Vec<TocEntry>,
    /// Plain text of the body, for the search index.
    pub text: String,
    /// Complete HTML document.
    pub document: String,
    directory_urls: bool,
    stage: PageStage,
}

impl ContentPage {
    /// Read the source file of a resolved page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the file cannot be read or is not UTF-8.
    pub fn load(page: &ResolvedPage, directory_urls: bool) -> Result<Self, RenderError> {
        let fail = |line, kind| RenderError {
            source_path: page.source.clone(),
            line,
            stage: PageStage::Loaded,
            kind,
        };

        let bytes = fs::read(&page.path).map_err(|e| fail(None, RenderErrorKind::Io(e)))?;
        let raw = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            fail(Some(line), RenderErrorKind::InvalidUtf8)
        })?;

        Ok(Self {
            url: page_url(&page.source, directory_urls),
            source: page.source.clone(),
            path: page.path.clone(),
            sections: page.sections.clone(),
            label: page.label.clone(),
            raw,
            front_matter: FrontMatter::default(),
            body_start: 0,
            body_line: 1,
            title: String::new(),
            html: String::new(),
            has_heading: false,
            toc: Vec::new(),
            text: String::new(),
            document: String::new(),
            directory_urls,
            stage: PageStage::Loaded,
        })
    }

    #[must_use]
    pub fn stage(&self) -> PageStage {
        self.stage
    }

    /// Markdown body after the front-matter block.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.raw[self.body_start..]
    }

    /// Output file path relative to the output directory.
    #[must_use]
    pub fn output_path(&self) -> String {
        output_path(&self.url)
    }

    /// Split off and parse the front-matter block.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the block is unterminated or malformed.
    pub fn parse_front_matter(mut self) -> Result<Self, RenderError> {
        debug_assert_eq!(self.stage, PageStage::Loaded);
        let document = parse_document(&self.raw).map_err(|e| RenderError {
            source_path: self.source.clone(),
            line: e.line(),
            stage: self.stage,
            kind: RenderErrorKind::FrontMatter(e),
        })?;

        self.body_start = self.raw.len() - document.body.len();
        self.body_line = document.body_line;
        self.front_matter = document.front_matter;
        self.stage = PageStage::FrontMatterParsed;
        Ok(self)
    }

    /// Render the Markdown body and settle the page title.
    ///
    /// The title is the front-matter `title`, else the first H1, else the nav
    /// label, else the file stem. The layout adds a heading when the body has
    /// no H1 of its own.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] with the file line of an invalid code block
    /// annotation.
    pub fn render_body(mut self, pipeline: &MarkdownPipeline) -> Result<Self, RenderError> {
        debug_assert_eq!(self.stage, PageStage::FrontMatterParsed);
        let context = LinkContext::new(self.source.clone(), self.directory_urls);
        let result = pipeline
            .render(self.body(), Some(&context))
            .map_err(|e: AnnotationError| RenderError {
                source_path: self.source.clone(),
                line: Some(e.line + self.body_line - 1),
                stage: self.stage,
                kind: RenderErrorKind::Annotation(e.message),
            })?;

        for warning in &result.warnings {
            tracing::warn!(path = %self.source, "{warning}");
        }

        self.title = self
            .front_matter
            .title
            .clone()
            .or_else(|| result.title.clone())
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| file_stem(&self.source).to_owned());

        self.has_heading = result.title.is_some();
        self.html = result.html;
        self.toc = result.toc;
        self.text = result.text;
        self.stage = PageStage::BodyRendered;
        tracing::debug!(path = %self.source, title = %self.title, "Rendered page");
        Ok(self)
    }

    /// Store the complete HTML document produced by `render`.
    pub fn apply_template(mut self, render: impl FnOnce(&Self) -> String) -> Self {
        debug_assert_eq!(self.stage, PageStage::BodyRendered);
        self.document = render(&self);
        self.stage = PageStage::TemplateApplied;
        self
    }

    /// Write the document under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the file or its directory cannot be created.
    pub fn write(mut self, output_dir: &Path) -> Result<Self, WriteError> {
        debug_assert_eq!(self.stage, PageStage::TemplateApplied);
        let path = output_dir.join(self.output_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WriteError::new(parent, e))?;
        }
        fs::write(&path, &self.document).map_err(|e| WriteError::new(&path, e))?;
        self.stage = PageStage::Written;
        Ok(self)
    }
}
