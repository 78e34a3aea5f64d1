//! Site build: resolve, render pages in parallel, then template and write
//! them in navigation order.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tome_config::{ConfigError, NavNode, SiteConfig};
use tome_renderer::{MarkdownPipeline, is_markdown};

use crate::assets::write_assets;
use crate::error::{BuildError, WriteError};
use crate::front_matter::FrontMatter;
use crate::markdown::markdown_options;
use crate::nav::{Navigation, PageSummary};
use crate::page::{ContentPage, RenderError};
use crate::plugins::Plugins;
use crate::resolver::{ResolvedPage, discover_nav, orphans, relative_source, resolve};
use crate::search::SearchIndex;
use crate::tags::{TAGS_TITLE, TagIndex};
use crate::template::{PageView, SiteTemplate};

/// Outcome of a build that got past resolution.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Source paths of pages written, in nav order.
    pub succeeded: Vec<String>,
    /// Pages that failed, in nav order.
    pub failed: Vec<RenderError>,
}

impl BuildReport {
    /// `"N succeeded, M failed"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds the site for one configuration.
///
/// Keeps rendered page bodies between runs so [`rebuild`](Self::rebuild) only
/// re-renders the files that changed.
pub struct SiteBuilder {
    config: SiteConfig,
    pipeline: MarkdownPipeline,
    plugins: Plugins,
    rendered: HashMap<String, ContentPage>,
}

impl SiteBuilder {
    /// Prepare a builder: select Markdown extensions and plugins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation or
    /// extension or plugin options are invalid.
    pub fn new(config: SiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = MarkdownPipeline::new(markdown_options(&config)?);
        let plugins = Plugins::from_config(&config)?;
        Ok(Self {
            config,
            pipeline,
            plugins,
            rendered: HashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Render every page.
    ///
    /// Content is resolved before anything is written: a missing page aborts
    /// with no output. With `clean`, the output directory is emptied first.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for missing content or output write failures.
    /// Individual page failures are listed in the [`BuildReport`].
    pub fn build(&mut self, clean: bool) -> Result<BuildReport, BuildError> {
        self.rendered.clear();
        self.run(clean, &HashSet::new())
    }

    /// Re-render the pages whose source files are in `changed`, then
    /// republish the whole site (titles and navigation may have moved).
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn rebuild(&mut self, changed: &[PathBuf]) -> Result<BuildReport, BuildError> {
        let root = &self.config.content_root;
        let changed: HashSet<String> = changed
            .iter()
            .filter_map(|path| relative_source(root, path))
            .collect();
        self.run(false, &changed)
    }

    fn run(&mut self, clean: bool, changed: &HashSet<String>) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let root = self.config.content_root.clone();
        let nav = self.nav()?;
        let resolved = resolve(&nav, &root)?;
        if self.config.nav.is_some() {
            for orphan in orphans(&root, &resolved) {
                tracing::warn!(path = %orphan, "Page not in nav, skipping");
            }
        }

        let output_dir = self.config.output_dir.clone();
        if clean && output_dir.exists() {
            fs::remove_dir_all(&output_dir).map_err(|e| WriteError::new(&output_dir, e))?;
        }

        let directory_urls = self.config.use_directory_urls;
        let outcomes: Vec<Result<ContentPage, RenderError>> = resolved
            .par_iter()
            .map(|page| match self.rendered.get(&page.source) {
                Some(cached) if !changed.contains(&page.source) => Ok(cached.clone()),
                _ => render_page(page, directory_urls, &self.pipeline),
            })
            .collect();

        self.rendered = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|page| (page.source.clone(), page.clone()))
            .collect();

        let report = self.publish(&nav, outcomes)?;
        tracing::info!(
            pages = report.succeeded.len(),
            failed = report.failed.len(),
            elapsed_ms = start.elapsed().as_millis(),
            output = %output_dir.display(),
            "Site built"
        );
        Ok(report)
    }

    /// The configured nav, or one discovered from the content root.
    fn nav(&self) -> Result<Vec<NavNode>, BuildError> {
        if let Some(nav) = &self.config.nav {
            return Ok(nav.clone());
        }
        let root = &self.config.content_root;
        discover_nav(root).map_err(|source| BuildError::Scan {
            path: root.clone(),
            source,
        })
    }

    /// Template and write pages in nav order, then the shared artifacts.
    fn publish(
        &self,
        nav: &[NavNode],
        outcomes: Vec<Result<ContentPage, RenderError>>,
    ) -> Result<BuildReport, BuildError> {
        let config = &self.config;
        let output_dir = &config.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| WriteError::new(output_dir, e))?;
        write_assets(output_dir)?;
        copy_static_files(&config.content_root, output_dir)?;

        let summaries: HashMap<String, PageSummary> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|page| {
                let summary = PageSummary {
                    title: page.title.clone(),
                    icon: page.front_matter.icon.clone(),
                };
                (page.source.clone(), summary)
            })
            .collect();
        let navigation = Navigation::build(nav, &summaries, config.use_directory_urls);

        let mut tags = TagIndex::default();
        if self.plugins.tags {
            for page in outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()) {
                tags.add(&page.front_matter.tags, &page.title, &page.url);
            }
        }
        let tags_url = (!tags.is_empty()).then(|| TagIndex::url(config.use_directory_urls));

        let template = SiteTemplate::new(config, &navigation)
            .with_search(self.plugins.search.is_some())
            .with_tags_page(tags_url.clone());
        let mut search = self.plugins.search.clone().map(SearchIndex::new);
        let mut report = BuildReport::default();

        for outcome in outcomes {
            match outcome {
                Ok(page) => {
                    let page = page
                        .apply_template(|page| template.render(&PageView::from(page)))
                        .write(output_dir)?;
                    if let Some(search) = &mut search {
                        search.add(&page.source, &page.url, &page.title, &page.text);
                    }
                    report.succeeded.push(page.source);
                }
                Err(e) => {
                    tracing::error!(path = %e.source_path, stage = %e.stage, "{e}");
                    report.failed.push(e);
                }
            }
        }

        if let Some(url) = tags_url {
            if navigation.pages().iter().any(|p| p.url == url) {
                tracing::warn!(url = %url, "A content page already uses the tags URL, skipping overview");
            } else {
                write_tags_page(&template, &tags, &url, output_dir)?;
            }
        }
        if let Some(search) = &search {
            search.write(output_dir)?;
        }
        Ok(report)
    }
}

fn render_page(
    page: &ResolvedPage,
    directory_urls: bool,
    pipeline: &MarkdownPipeline,
) -> Result<ContentPage, RenderError> {
    ContentPage::load(page, directory_urls)?
        .parse_front_matter()?
        .render_body(pipeline)
}

fn write_tags_page(
    template: &SiteTemplate<'_>,
    tags: &TagIndex,
    url: &str,
    output_dir: &Path,
) -> Result<(), WriteError> {
    let (content, toc) = tags.render(url);
    let front_matter = FrontMatter::default();
    let html = template.render(&PageView {
        url,
        title: TAGS_TITLE,
        content: &content,
        has_heading: true,
        toc: &toc,
        front_matter: &front_matter,
        sections: &[],
    });
    let path = output_dir.join(tome_renderer::output_path(url));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| WriteError::new(parent, e))?;
    }
    fs::write(&path, html).map_err(|e| WriteError::new(&path, e))
}

/// Copy non-Markdown files (images, downloads, extra CSS/JS) to the output.
///
/// Hidden and `_`-prefixed paths are skipped, and so is the output directory
/// when it lives inside the content root.
fn copy_static_files(content_root: &Path, output_dir: &Path) -> Result<usize, WriteError> {
    let pattern = format!("{}/**/*", glob::Pattern::escape(&content_root.to_string_lossy()));
    let Ok(paths) = glob::glob(&pattern) else {
        return Ok(0);
    };

    let mut count = 0;
    for path in paths.filter_map(Result::ok) {
        if !path.is_file() || path.starts_with(output_dir) {
            continue;
        }
        let Some(relative) = relative_source(content_root, &path) else {
            continue;
        };
        if is_markdown(&relative) || relative.split('/').any(|s| s.starts_with(['.', '_'])) {
            continue;
        }
        let target = output_dir.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| WriteError::new(parent, e))?;
        }
        fs::copy(&path, &target).map_err(|e| WriteError::new(&target, e))?;
        count += 1;
    }
    tracing::debug!(count, "Copied static files");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tome_config::ConfigFormat;

    use crate::page::RenderErrorKind;
    use crate::search::SEARCH_INDEX_PATH;

    static_assertions::assert_impl_all!(SiteBuilder: Send, Sync);

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn page(&self, source: &str, content: &[u8]) -> &Self {
            let path = self.dir.path().join("docs").join(source);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn builder(&self, yaml: &str) -> SiteBuilder {
            let config = SiteConfig::parse(yaml, ConfigFormat::Yaml, self.dir.path()).unwrap();
            SiteBuilder::new(config).unwrap()
        }

        fn output(&self, path: &str) -> PathBuf {
            self.dir.path().join("site").join(path)
        }

        fn read(&self, path: &str) -> String {
            fs::read_to_string(self.output(path)).unwrap()
        }
    }

    #[test]
    fn test_output_dir_over_content_rejected() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"# Home\n");
        let mut config =
            SiteConfig::parse("site_name: Notes\n", ConfigFormat::Yaml, fixture.dir.path())
                .unwrap();
        config.output_dir = fixture.dir.path().to_path_buf();

        let err = SiteBuilder::new(config).err().unwrap();
        assert_eq!(err.key(), Some("output_dir"));
        assert!(fixture.dir.path().join("docs/index.md").is_file());
    }

    #[test]
    fn test_unwritable_output_aborts_build() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"# Home\n").page("a.md", b"# A\n");
        fs::create_dir_all(fixture.output("")).unwrap();
        fs::write(fixture.output("a"), b"not a directory").unwrap();
        let mut builder = fixture.builder("site_name: Notes\n");

        let err = builder.build(false).unwrap_err();
        let BuildError::Write(err) = err else {
            panic!("expected write error, got {err:?}");
        };
        assert_eq!(err.path, fixture.output("a"));
        assert!(err.to_string().starts_with("Failed to write "));
    }

    #[test]
    fn test_plain_page_in_template() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"text");
        let mut builder = fixture.builder("site_name: Notes\nnav:\n  - Home: index.md\n");

        let report = builder.build(false).unwrap();
        assert!(report.is_success());
        assert_eq!(report.succeeded, ["index.md"]);

        let html = fixture.read("index.html");
        assert!(html.contains("<article class=\"md-content\">\n<h1>Home</h1>\n<p>text</p>\n</article>"));
        assert!(html.contains("<title>Home - Notes</title>"));
        assert!(fixture.output("assets/stylesheets/main.css").is_file());
    }

    #[test]
    fn test_nested_nav_output_tree() {
        let fixture = Fixture::new();
        fixture
            .page("index.md", b"# Home\n")
            .page("php/index.md", b"# PHP\n");
        let mut builder = fixture.builder(
            "site_name: Notes\nnav:\n  - Home: index.md\n  - PHP:\n    - Index: php/index.md\n",
        );

        builder.build(false).unwrap();
        assert!(fixture.output("index.html").is_file());
        let php = fixture.read("php/index.html");
        assert!(php.contains(r#"<li class="md-path__item">PHP</li>"#));
        assert!(php.contains("md-nav__link--active"));
    }

    #[test]
    fn test_missing_content_writes_nothing() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"text");
        let mut builder =
            fixture.builder("site_name: Notes\nnav:\n  - Home: index.md\n  - Gone: missing.md\n");

        let err = builder.build(false).unwrap_err();
        match err {
            BuildError::MissingContent(e) => assert_eq!(e.missing, ["missing.md"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fixture.output("index.html").exists());
    }

    #[test]
    fn test_bad_page_does_not_stop_others() {
        let fixture = Fixture::new();
        fixture
            .page("a.md", b"# A\n")
            .page("b.md", b"---\ntitle: [unclosed\n---\n# B\n")
            .page("c.md", b"# C\n");
        let mut builder = fixture.builder(
            "site_name: Notes\nnav:\n  - A: a.md\n  - B: b.md\n  - C: c.md\n",
        );

        let report = builder.build(false).unwrap();
        assert_eq!(report.summary(), "2 succeeded, 1 failed");
        assert!(!report.is_success());
        assert_eq!(report.failed[0].source_path, "b.md");
        assert!(matches!(report.failed[0].kind, RenderErrorKind::FrontMatter(_)));
        assert!(fixture.output("a/index.html").is_file());
        assert!(fixture.output("c/index.html").is_file());
        assert!(!fixture.output("b/index.html").exists());
    }

    #[test]
    fn test_front_matter_icon_in_nav() {
        let fixture = Fixture::new();
        fixture
            .page("index.md", b"# Home\n")
            .page("php.md", b"---\nicon: material/language-php\n---\n# PHP\n");
        let mut builder = fixture.builder("site_name: Notes\n");
        builder.build(false).unwrap();

        assert!(fixture.read("index.html").contains(concat!(
            r#"<a href="php/" class="md-nav__link">"#,
            r#"<span class="twemoji" data-icon="material/language-php" aria-hidden="true"></span> PHP</a>"#
        )));
    }

    #[test]
    fn test_search_index() {
        let fixture = Fixture::new();
        fixture
            .page("index.md", b"# Welcome\n\nHello world\n")
            .page("php/arrays.md", b"# Arrays\n\nOrdered maps\n");
        let mut builder = fixture.builder(
            "site_name: Notes\nnav:\n  - Home: index.md\n  - PHP:\n    - php/arrays.md\n",
        );
        builder.build(false).unwrap();

        let index: serde_json::Value =
            serde_json::from_str(&fixture.read(SEARCH_INDEX_PATH)).unwrap();
        assert_eq!(index["docs"]["index.md"]["title"], "Welcome");
        assert_eq!(index["docs"]["index.md"]["location"], "");
        assert_eq!(index["docs"]["php/arrays.md"]["location"], "php/arrays/");
        assert_eq!(
            index["docs"]["php/arrays.md"]["tokens"],
            serde_json::json!(["arrays", "ordered", "maps"])
        );
    }

    #[test]
    fn test_search_disabled() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"x");
        let mut builder = fixture.builder("site_name: Notes\nplugins: []\n");
        builder.build(false).unwrap();
        assert!(!fixture.output(SEARCH_INDEX_PATH).exists());
        assert!(!fixture.read("index.html").contains("search.js"));
    }

    #[test]
    fn test_tags_page() {
        let fixture = Fixture::new();
        fixture.page("a.md", b"---\ntags: [php]\n---\n# A\n");
        let mut builder = fixture.builder("site_name: Notes\nplugins: [search, tags]\n");
        builder.build(false).unwrap();

        let tags = fixture.read("tags/index.html");
        assert!(tags.contains(r#"<a href="../a/">A</a>"#));
        assert!(fixture.read("a/index.html").contains(r#"href="../tags/#php""#));
    }

    #[test]
    fn test_discovered_nav_and_static_files() {
        let fixture = Fixture::new();
        fixture
            .page("index.md", b"# Home\n")
            .page("guide/setup.md", b"# Setup\n")
            .page("img/logo.png", b"\x89PNG")
            .page("_drafts/wip.md", b"# WIP\n");
        let mut builder = fixture.builder("site_name: Notes\n");

        let report = builder.build(false).unwrap();
        assert_eq!(report.succeeded, ["index.md", "guide/setup.md"]);
        assert!(fixture.output("img/logo.png").is_file());
        assert!(!fixture.output("_drafts").exists());
        assert!(fixture.read("index.html").contains(">Setup</a>"));
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"x");
        let stale = fixture.output("old/index.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale").unwrap();

        let mut builder = fixture.builder("site_name: Notes\n");
        builder.build(false).unwrap();
        assert!(stale.exists());
        builder.build(true).unwrap();
        assert!(!stale.exists());
        assert!(fixture.output("index.html").is_file());
    }

    #[test]
    fn test_rebuild_renders_only_changed_pages() {
        let fixture = Fixture::new();
        fixture.page("a.md", b"first a\n").page("b.md", b"first b\n");
        let mut builder = fixture.builder("site_name: Notes\nnav:\n  - a.md\n  - b.md\n");
        builder.build(false).unwrap();

        fixture.page("a.md", b"second a\n").page("b.md", b"second b\n");
        let changed = [fixture.dir.path().join("docs/a.md")];
        let report = builder.rebuild(&changed).unwrap();

        assert_eq!(report.summary(), "2 succeeded, 0 failed");
        assert!(fixture.read("a/index.html").contains("second a"));
        assert!(fixture.read("b/index.html").contains("first b"));
    }

    #[test]
    fn test_rebuild_retries_failed_pages() {
        let fixture = Fixture::new();
        fixture.page("a.md", b"---\nbroken\n");
        let mut builder = fixture.builder("site_name: Notes\nnav:\n  - a.md\n");
        assert!(!builder.build(false).unwrap().is_success());

        fixture.page("a.md", b"fixed\n");
        let report = builder.rebuild(&[]).unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_file_urls() {
        let fixture = Fixture::new();
        fixture.page("index.md", b"x").page("php/arrays.md", b"y");
        let mut builder = fixture.builder(
            "site_name: Notes\nuse_directory_urls: false\nnav:\n  - index.md\n  - php/arrays.md\n",
        );
        builder.build(false).unwrap();
        assert!(fixture.output("php/arrays.html").is_file());
        assert!(fixture.read("php/arrays.html").contains(r#"href="../index.html""#));
    }
}
