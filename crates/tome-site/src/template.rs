//! Theme template: wraps a rendered page body in the site layout.
//!
//! Markup follows the class names of the bundled stylesheet (`md-header`,
//! `md-nav`, `md-content`, ...). Every link is relative to the page, so the
//! output tree works from any mount point and from `file://`.

use std::fmt::Write;

use tome_config::{PaletteVariant, SiteConfig};
use tome_renderer::{TocEntry, escape_html, relative_path, slugify};

use crate::assets::{MAIN_CSS, SEARCH_JS, THEME_JS};
use crate::front_matter::FrontMatter;
use crate::nav::{NavItem, Navigation, PageLink};
use crate::page::ContentPage;
use crate::search::SEARCH_INDEX_PATH;

const DEFAULT_LOGO_ICON: &str = "material/library";
const DEFAULT_REPO_ICON: &str = "fontawesome/brands/git-alt";

/// What the template needs from one page.
#[derive(Clone, Copy, Debug)]
pub struct PageView<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    /// False when the layout must supply the page H1.
    pub has_heading: bool,
    pub toc: &'a [TocEntry],
    pub front_matter: &'a FrontMatter,
    /// Enclosing nav section labels, outermost first.
    pub sections: &'a [String],
}

impl<'a> From<&'a ContentPage> for PageView<'a> {
    fn from(page: &'a ContentPage) -> Self {
        Self {
            url: &page.url,
            title: &page.title,
            content: &page.html,
            has_heading: page.has_heading,
            toc: &page.toc,
            front_matter: &page.front_matter,
            sections: &page.sections,
        }
    }
}

/// Site layout shared by every page of a build.
pub struct SiteTemplate<'a> {
    config: &'a SiteConfig,
    navigation: &'a Navigation,
    search: bool,
    tags_url: Option<String>,
}

impl<'a> SiteTemplate<'a> {
    #[must_use]
    pub fn new(config: &'a SiteConfig, navigation: &'a Navigation) -> Self {
        Self {
            config,
            navigation,
            search: false,
            tags_url: None,
        }
    }

    /// Show the search box and load the search script.
    #[must_use]
    pub fn with_search(mut self, enabled: bool) -> Self {
        self.search = enabled;
        self
    }

    /// Link tag chips to the tags overview page at `url`.
    #[must_use]
    pub fn with_tags_page(mut self, url: Option<String>) -> Self {
        self.tags_url = url;
        self
    }

    /// Render a complete HTML document.
    #[must_use]
    pub fn render(&self, page: &PageView<'_>) -> String {
        let mut out = String::with_capacity(page.content.len() + 8192);
        let theme = &self.config.theme;

        writeln!(
            out,
            r#"<!doctype html>
<html lang="{}" class="no-js">"#,
            escape_html(&theme.language)
        )
        .unwrap();
        self.head(page, &mut out);

        out.push_str("<body dir=\"ltr\"");
        if let Some(palette) = theme.default_palette() {
            palette_attrs(palette, &mut out);
        }
        out.push_str(">\n");
        self.header(page, &mut out);

        out.push_str("<div class=\"md-container\">\n<main class=\"md-main\">\n");
        let integrate_toc = theme.has_feature("toc.integrate");
        if !page.front_matter.hides("navigation") {
            self.primary_nav(page, integrate_toc, &mut out);
        }
        if !integrate_toc && !page.front_matter.hides("toc") && !page.toc.is_empty() {
            out.push_str(
                "<nav class=\"md-nav md-nav--secondary\" aria-label=\"Table of contents\">\n\
                 <label class=\"md-nav__title\">Table of contents</label>\n",
            );
            write_toc(page.toc, &mut out);
            out.push_str("</nav>\n");
        }

        out.push_str("<article class=\"md-content\"");
        if theme.has_feature("content.code.copy") {
            out.push_str(" data-md-code-copy");
        }
        out.push_str(">\n");
        breadcrumbs(page.sections, &mut out);
        self.tags(page, &mut out);
        if !page.has_heading {
            out.push_str("<h1>");
            out.push_str(&escape_html(page.title));
            out.push_str("</h1>\n");
        }
        out.push_str(page.content);
        out.push_str("\n</article>\n</main>\n");

        if theme.has_feature("navigation.top") {
            out.push_str("<a href=\"#\" class=\"md-top\" data-md-component=\"top\" hidden>Back to top</a>\n");
        }
        self.footer(page, &mut out);
        out.push_str("</div>\n");
        self.scripts(page, &mut out);
        out.push_str("</body>\n</html>\n");
        out
    }

    fn head(&self, page: &PageView<'_>, out: &mut String) {
        let config = self.config;
        out.push_str(
            "<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n",
        );
        let description = page
            .front_matter
            .description
            .as_deref()
            .or(config.site_description.as_deref());
        if let Some(description) = description {
            writeln!(out, r#"<meta name="description" content="{}">"#, escape_html(description)).unwrap();
        }
        if let Some(author) = &config.site_author {
            writeln!(out, r#"<meta name="author" content="{}">"#, escape_html(author)).unwrap();
        }
        if let Some(site_url) = &config.site_url {
            let canonical = format!("{}/{}", site_url.trim_end_matches('/'), page.url);
            writeln!(out, r#"<link rel="canonical" href="{}">"#, escape_html(&canonical)).unwrap();
        }
        if let Some(favicon) = &config.theme.favicon {
            writeln!(out, r#"<link rel="icon" href="{}">"#, self.href(page.url, favicon)).unwrap();
        }
        out.push_str("<meta name=\"generator\" content=\"tome\">\n");

        let title = if page.title == config.site_name {
            escape_html(&config.site_name)
        } else {
            format!("{} - {}", escape_html(page.title), escape_html(&config.site_name))
        };
        writeln!(out, "<title>{title}</title>").unwrap();

        writeln!(
            out,
            r#"<link rel="stylesheet" href="{}">"#,
            self.href(page.url, MAIN_CSS)
        )
        .unwrap();
        self.fonts(out);
        for css in &config.extra_css {
            writeln!(out, r#"<link rel="stylesheet" href="{}">"#, self.href(page.url, css)).unwrap();
        }
        out.push_str("</head>\n");
    }

    fn fonts(&self, out: &mut String) {
        let font = &self.config.theme.font;
        let (Some(text), Some(code)) = (font.text(), font.code()) else {
            return;
        };
        writeln!(
            out,
            r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
<link rel="stylesheet" href="https://fonts.googleapis.com/css?family={}:300,300i,400,400i,700,700i%7C{}:400,400i,700,700i&amp;display=fallback">
<style>:root{{--md-text-font:"{}";--md-code-font:"{}"}}</style>"#,
            escape_html(&text.replace(' ', "+")),
            escape_html(&code.replace(' ', "+")),
            escape_html(text),
            escape_html(code),
        )
        .unwrap();
    }

    fn header(&self, page: &PageView<'_>, out: &mut String) {
        let config = self.config;
        let theme = &config.theme;
        out.push_str("<header class=\"md-header\" data-md-component=\"header\">\n");

        write!(
            out,
            r#"<a href="{}" title="{}" class="md-header__button md-logo" aria-label="{1}">"#,
            self.href(page.url, ""),
            escape_html(&config.site_name)
        )
        .unwrap();
        match &theme.logo {
            Some(logo) => write!(out, r#"<img src="{}" alt="logo">"#, self.href(page.url, logo)).unwrap(),
            None => icon(theme.icon.logo.as_deref().unwrap_or(DEFAULT_LOGO_ICON), out),
        }
        out.push_str("</a>\n");

        writeln!(
            out,
            r#"<div class="md-header__title"><span class="md-header__topic">{}</span><span class="md-header__topic">{}</span></div>"#,
            escape_html(&config.site_name),
            escape_html(page.title)
        )
        .unwrap();

        if theme.palette.len() > 1 {
            palette_toggle(&theme.palette, out);
        }

        if self.search {
            writeln!(
                out,
                r#"<form class="md-search" role="search" data-md-component="search">
<input type="text" class="md-search__input" name="q" placeholder="Search" aria-label="Search" autocomplete="off">
<div class="md-search__output"><ol class="md-search-result__list"></ol></div>
</form>"#
            )
            .unwrap();
        }

        if let Some(repo_url) = &config.repo_url {
            write!(out, r#"<a href="{}" title="Go to repository" class="md-source">"#, escape_html(repo_url)).unwrap();
            icon(theme.icon.repo.as_deref().unwrap_or(DEFAULT_REPO_ICON), out);
            let name = config.repo_name.as_deref().unwrap_or_else(|| repo_display_name(repo_url));
            writeln!(out, r#"<span class="md-source__repository">{}</span></a>"#, escape_html(name)).unwrap();
        }

        out.push_str("</header>\n");
    }

    fn primary_nav(&self, page: &PageView<'_>, integrate_toc: bool, out: &mut String) {
        writeln!(
            out,
            r#"<nav class="md-nav md-nav--primary" aria-label="Navigation">
<label class="md-nav__title">{}</label>"#,
            escape_html(&self.config.site_name)
        )
        .unwrap();
        let toc = (integrate_toc && !page.front_matter.hides("toc")).then_some(page.toc);
        self.nav_list(&self.navigation.items, page.url, toc, out);
        out.push_str("</nav>\n");
    }

    fn nav_list(&self, items: &[NavItem], current: &str, toc: Option<&[TocEntry]>, out: &mut String) {
        out.push_str("<ul class=\"md-nav__list\">\n");
        for item in items {
            match item {
                NavItem::Page { title, url, icon } if url == current => {
                    write!(
                        out,
                        r#"<li class="md-nav__item md-nav__item--active"><a href="{}" class="md-nav__link md-nav__link--active" aria-current="page">{}</a>"#,
                        self.href(current, url),
                        link_label(icon.as_deref(), title)
                    )
                    .unwrap();
                    if let Some(toc) = toc.filter(|toc| !toc.is_empty()) {
                        out.push('\n');
                        write_toc(toc, out);
                    }
                    out.push_str("</li>\n");
                }
                NavItem::Page { title, url, icon } => {
                    writeln!(
                        out,
                        r#"<li class="md-nav__item"><a href="{}" class="md-nav__link">{}</a></li>"#,
                        self.href(current, url),
                        link_label(icon.as_deref(), title)
                    )
                    .unwrap();
                }
                NavItem::Link { title, url } => {
                    writeln!(
                        out,
                        r#"<li class="md-nav__item"><a href="{}" class="md-nav__link md-nav__link--external">{}</a></li>"#,
                        escape_html(url),
                        escape_html(title)
                    )
                    .unwrap();
                }
                NavItem::Section { title, children } => {
                    let active = if item.contains(current) {
                        " md-nav__item--active"
                    } else {
                        ""
                    };
                    writeln!(
                        out,
                        r#"<li class="md-nav__item md-nav__item--section{active}"><span class="md-nav__link">{}</span>"#,
                        escape_html(title)
                    )
                    .unwrap();
                    self.nav_list(children, current, toc, out);
                    out.push_str("</li>\n");
                }
            }
        }
        out.push_str("</ul>\n");
    }

    fn tags(&self, page: &PageView<'_>, out: &mut String) {
        let tags = &page.front_matter.tags;
        if tags.is_empty() || page.front_matter.hides("tags") {
            return;
        }
        out.push_str("<nav class=\"md-tags\">");
        for tag in tags {
            match &self.tags_url {
                Some(tags_url) => write!(
                    out,
                    r#"<a href="{}#{}" class="md-tag">{}</a>"#,
                    self.href(page.url, tags_url),
                    slugify(tag),
                    escape_html(tag)
                )
                .unwrap(),
                None => write!(out, r#"<span class="md-tag">{}</span>"#, escape_html(tag)).unwrap(),
            }
        }
        out.push_str("</nav>\n");
    }

    fn footer(&self, page: &PageView<'_>, out: &mut String) {
        out.push_str("<footer class=\"md-footer\">\n");
        if self.config.theme.has_feature("navigation.footer") && !page.front_matter.hides("footer") {
            let previous = self.navigation.previous(page.url);
            let next = self.navigation.next(page.url);
            if previous.is_some() || next.is_some() {
                out.push_str("<nav class=\"md-footer__inner\" aria-label=\"Footer\">\n");
                if let Some(link) = previous {
                    self.footer_link(page.url, link, "prev", "Previous", out);
                }
                if let Some(link) = next {
                    self.footer_link(page.url, link, "next", "Next", out);
                }
                out.push_str("</nav>\n");
            }
        }
        if let Some(copyright) = &self.config.copyright {
            // Copyright notices commonly carry markup (`&copy;`, links).
            writeln!(out, r#"<div class="md-copyright">{copyright}</div>"#).unwrap();
        }
        out.push_str("</footer>\n");
    }

    fn footer_link(&self, current: &str, link: &PageLink, rel: &str, direction: &str, out: &mut String) {
        writeln!(
            out,
            r#"<a href="{}" class="md-footer__link md-footer__link--{rel}" rel="{rel}"><span class="md-footer__direction">{direction}</span><span class="md-footer__title">{}</span></a>"#,
            self.href(current, &link.url),
            escape_html(&link.title)
        )
        .unwrap();
    }

    fn scripts(&self, page: &PageView<'_>, out: &mut String) {
        writeln!(out, r#"<script src="{}"></script>"#, self.href(page.url, THEME_JS)).unwrap();
        if self.search {
            writeln!(
                out,
                r#"<script src="{}" data-index="{}" data-base="{}"></script>"#,
                self.href(page.url, SEARCH_JS),
                self.href(page.url, SEARCH_INDEX_PATH),
                escape_html(&relative_path(page.url, ""))
            )
            .unwrap();
        }
        for js in &self.config.extra_javascript {
            writeln!(out, r#"<script src="{}"></script>"#, self.href(page.url, js)).unwrap();
        }
    }

    /// Link from the page at `from` to a site-relative `target`, escaped for
    /// an attribute. Absolute URLs pass through; `""` is the home page.
    fn href(&self, from: &str, target: &str) -> String {
        if target.contains("://") || target.starts_with(['/', '#']) {
            return escape_html(target);
        }
        let target = if target.is_empty() && !self.config.use_directory_urls {
            "index.html"
        } else {
            target
        };
        escape_html(&relative_path(from, target))
    }
}

fn palette_attrs(palette: &PaletteVariant, out: &mut String) {
    for (name, value) in [
        ("scheme", &palette.scheme),
        ("primary", &palette.primary),
        ("accent", &palette.accent),
    ] {
        if let Some(value) = value {
            write!(out, r#" data-md-color-{name}="{}""#, escape_html(value)).unwrap();
        }
    }
}

/// One radio input per variant; each label switches to the following one.
fn palette_toggle(palette: &[PaletteVariant], out: &mut String) {
    out.push_str("<form class=\"md-header__option\" data-md-component=\"palette\">\n");
    for (i, variant) in palette.iter().enumerate() {
        let checked = if i == 0 { " checked" } else { "" };
        write!(out, r#"<input class="md-option""#).unwrap();
        if let Some(media) = &variant.media {
            write!(out, r#" data-md-color-media="{}""#, escape_html(media)).unwrap();
        }
        palette_attrs(variant, out);
        writeln!(out, r#" type="radio" name="__palette" id="__palette_{i}"{checked}>"#).unwrap();

        let toggle = variant.toggle.clone().unwrap_or_default();
        let next = (i + 1) % palette.len();
        let hidden = if i == 0 { "" } else { " hidden" };
        write!(
            out,
            r#"<label class="md-header__button md-icon" title="{}" for="__palette_{next}"{hidden}>"#,
            escape_html(toggle.name.as_deref().unwrap_or("Switch color scheme"))
        )
        .unwrap();
        icon(toggle.icon.as_deref().unwrap_or("material/brightness-4"), out);
        out.push_str("</label>\n");
    }
    out.push_str("</form>\n");
}

fn breadcrumbs(sections: &[String], out: &mut String) {
    if sections.is_empty() {
        return;
    }
    out.push_str("<nav class=\"md-path\" aria-label=\"Navigation\"><ol class=\"md-path__list\">");
    for section in sections {
        write!(out, r#"<li class="md-path__item">{}</li>"#, escape_html(section)).unwrap();
    }
    out.push_str("</ol></nav>\n");
}

/// Nested list from flat heading levels.
fn write_toc(entries: &[TocEntry], out: &mut String) {
    let Some(first) = entries.first() else {
        return;
    };
    out.push_str("<ul class=\"md-nav__list\">\n");
    let mut levels = vec![first.level];
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            let current = levels.last().copied().unwrap_or(entry.level);
            if entry.level > current {
                out.push_str("\n<ul class=\"md-nav__list\">\n");
                levels.push(entry.level);
            } else {
                out.push_str("</li>\n");
                while levels.len() > 1 && levels.last().is_some_and(|&l| entry.level < l) {
                    levels.pop();
                    out.push_str("</ul>\n</li>\n");
                }
            }
        }
        write!(
            out,
            r##"<li class="md-nav__item"><a href="#{}" class="md-nav__link">{}</a>"##,
            escape_html(&entry.id),
            escape_html(&entry.title)
        )
        .unwrap();
    }
    out.push_str("</li>\n");
    for _ in 1..levels.len() {
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n");
}

fn icon(name: &str, out: &mut String) {
    write!(
        out,
        r#"<span class="twemoji" data-icon="{}" aria-hidden="true"></span>"#,
        escape_html(name)
    )
    .unwrap();
}

/// Escaped nav link text, led by the page icon if it has one.
fn link_label(name: Option<&str>, title: &str) -> String {
    let mut label = String::new();
    if let Some(name) = name {
        icon(name, &mut label);
        label.push(' ');
    }
    label.push_str(&escape_html(title));
    label
}

/// `https://github.com/user/notes` → `user/notes`.
fn repo_display_name(url: &str) -> &str {
    let path = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path));
    let path = path.trim_end_matches('/').trim_end_matches(".git");
    if path.is_empty() { url } else { path }
}
