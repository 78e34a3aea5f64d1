//! Navigation menu built from the configured tree and rendered page titles.

use std::collections::HashMap;

use serde::Serialize;
use tome_config::NavNode;
use tome_renderer::page_url;

use crate::resolver::{file_stem, normalize};

/// Menu entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NavItem {
    /// Content page.
    Page {
        title: String,
        /// Page URL without leading slash (`""` for the home page).
        url: String,
        /// Front-matter `icon`.
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    /// External link.
    Link { title: String, url: String },
    /// Section with children in declared order.
    Section {
        title: String,
        children: Vec<NavItem>,
    },
}

impl NavItem {
    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Page { title, .. } | Self::Link { title, .. } | Self::Section { title, .. } => {
                title
            }
        }
    }

    /// Check whether this item is, or contains, the page at `url`.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        match self {
            Self::Page { url: own, .. } => own == url,
            Self::Link { .. } => false,
            Self::Section { children, .. } => children.iter().any(|c| c.contains(url)),
        }
    }
}

/// Rendered page details the menu shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    pub icon: Option<String>,
}

/// Link to a neighbouring page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub title: String,
    pub url: String,
}

/// Site navigation: the menu tree plus pages in reading order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub items: Vec<NavItem>,
    #[serde(skip)]
    pages: Vec<PageLink>,
}

impl Navigation {
    /// Build the menu for `nav`.
    ///
    /// Leaf titles come from the nav label, else from `pages` (source path →
    /// rendered page), else from the file stem. Icons come from `pages`.
    #[must_use]
    pub fn build(
        nav: &[NavNode],
        pages: &HashMap<String, PageSummary>,
        directory_urls: bool,
    ) -> Self {
        let mut links = Vec::new();
        let items = convert(nav, pages, directory_urls, &mut links);
        Self {
            items,
            pages: links,
        }
    }

    /// Pages in reading order.
    #[must_use]
    pub fn pages(&self) -> &[PageLink] {
        &self.pages
    }

    /// Page before the one at `url`.
    #[must_use]
    pub fn previous(&self, url: &str) -> Option<&PageLink> {
        let index = self.position(url)?;
        index.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    /// Page after the one at `url`.
    #[must_use]
    pub fn next(&self, url: &str) -> Option<&PageLink> {
        let index = self.position(url)?;
        self.pages.get(index + 1)
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.url == url)
    }
}

fn convert(
    nodes: &[NavNode],
    summaries: &HashMap<String, PageSummary>,
    directory_urls: bool,
    pages: &mut Vec<PageLink>,
) -> Vec<NavItem> {
    nodes
        .iter()
        .map(|node| match node {
            NavNode::Page { label, path } => {
                let source = normalize(path);
                let summary = summaries.get(&source);
                let title = label
                    .clone()
                    .or_else(|| summary.map(|s| s.title.clone()))
                    .unwrap_or_else(|| file_stem(&source).to_owned());
                let url = page_url(&source, directory_urls);
                pages.push(PageLink {
                    title: title.clone(),
                    url: url.clone(),
                });
                NavItem::Page {
                    title,
                    url,
                    icon: summary.and_then(|s| s.icon.clone()),
                }
            }
            NavNode::Link { label, url } => NavItem::Link {
                title: label.clone(),
                url: url.clone(),
            },
            NavNode::Section { label, children } => NavItem::Section {
                title: label.clone(),
                children: convert(children, summaries, directory_urls, pages),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nav() -> Vec<NavNode> {
        vec![
            NavNode::page("Home", "index.md"),
            NavNode::section(
                "PHP",
                vec![
                    NavNode::page("Index", "php/index.md"),
                    NavNode::Page {
                        label: None,
                        path: "php/arrays.md".to_owned(),
                    },
                    NavNode::Link {
                        label: "Manual".to_owned(),
                        url: "https://php.net".to_owned(),
                    },
                ],
            ),
            NavNode::Page {
                label: None,
                path: "about.md".to_owned(),
            },
        ]
    }

    #[test]
    fn test_titles_and_urls() {
        let summaries = HashMap::from([(
            "php/arrays.md".to_owned(),
            PageSummary {
                title: "Working with Arrays".to_owned(),
                icon: Some("material/code-array".to_owned()),
            },
        )]);
        let navigation = Navigation::build(&nav(), &summaries, true);

        assert_eq!(
            navigation.items[1],
            NavItem::Section {
                title: "PHP".to_owned(),
                children: vec![
                    NavItem::Page {
                        title: "Index".to_owned(),
                        url: "php/".to_owned(),
                        icon: None,
                    },
                    NavItem::Page {
                        title: "Working with Arrays".to_owned(),
                        url: "php/arrays/".to_owned(),
                        icon: Some("material/code-array".to_owned()),
                    },
                    NavItem::Link {
                        title: "Manual".to_owned(),
                        url: "https://php.net".to_owned()
                    },
                ],
            }
        );
        assert_eq!(navigation.items[2].title(), "about");
    }

    #[test]
    fn test_reading_order() {
        let navigation = Navigation::build(&nav(), &HashMap::new(), false);
        let urls: Vec<_> = navigation.pages().iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            ["index.html", "php/index.html", "php/arrays.html", "about.html"]
        );
    }

    #[test]
    fn test_previous_next() {
        let navigation = Navigation::build(&nav(), &HashMap::new(), true);
        assert_eq!(navigation.previous(""), None);
        assert_eq!(navigation.next("").map(|p| p.url.as_str()), Some("php/"));
        assert_eq!(
            navigation.previous("about/").map(|p| p.title.as_str()),
            Some("arrays")
        );
        assert_eq!(navigation.next("about/"), None);
        assert_eq!(navigation.next("unknown/"), None);
    }

    #[test]
    fn test_section_contains_page() {
        let navigation = Navigation::build(&nav(), &HashMap::new(), true);
        assert!(navigation.items[1].contains("php/arrays/"));
        assert!(!navigation.items[1].contains(""));
    }
}
