//! `tags` plugin: an overview page listing pages by front-matter tag.

use std::collections::BTreeMap;
use std::fmt::Write;

use tome_renderer::{TocEntry, escape_html, page_url, relative_path, slugify};

use crate::nav::PageLink;

/// Source name the overview page is published under.
pub const TAGS_SOURCE: &str = "tags.md";

pub const TAGS_TITLE: &str = "Tags";

/// Tag → tagged pages in nav order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: BTreeMap<String, Vec<PageLink>>,
}

impl TagIndex {
    /// URL of the overview page.
    #[must_use]
    pub fn url(directory_urls: bool) -> String {
        page_url(TAGS_SOURCE, directory_urls)
    }

    pub fn add(&mut self, tags: &[String], title: &str, url: &str) {
        for tag in tags {
            self.tags.entry(tag.clone()).or_default().push(PageLink {
                title: title.to_owned(),
                url: url.to_owned(),
            });
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Body of the overview page at `url`, with one heading per tag.
    #[must_use]
    pub fn render(&self, url: &str) -> (String, Vec<TocEntry>) {
        let mut html = format!("<h1 id=\"tags\">{TAGS_TITLE}</h1>\n");
        let mut toc = Vec::with_capacity(self.tags.len());

        for (tag, pages) in &self.tags {
            let id = slugify(tag);
            writeln!(html, r#"<h2 id="{id}">{}</h2>"#, escape_html(tag)).unwrap();
            html.push_str("<ul>\n");
            for page in pages {
                writeln!(
                    html,
                    r#"<li><a href="{}">{}</a></li>"#,
                    escape_html(&relative_path(url, &page.url)),
                    escape_html(&page.title)
                )
                .unwrap();
            }
            html.push_str("</ul>\n");
            toc.push(TocEntry {
                level: 2,
                title: tag.clone(),
                id,
            });
        }
        (html, toc)
    }
}
