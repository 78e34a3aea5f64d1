//! Navigation tree parsing.
//!
//! The `nav` key is an ordered list. Each entry is one of:
//!
//! - a bare path (`- index.md`), labelled later from the page itself
//! - `Label: path.md`, a labelled page
//! - `Label: https://...`, an external link
//! - `Label: [entries...]`, a section
//!
//! Errors name the offending entry by its position, e.g. `nav[1].PHP[0]`.

use std::path::{Component, Path};

use serde_json::Value;

use crate::ConfigError;

/// Node of the navigation tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavNode {
    /// Content page leaf.
    Page {
        /// Display label. `None` for bare path entries.
        label: Option<String>,
        /// Path of the source file relative to the content root.
        path: String,
    },
    /// External link leaf. Never resolved against the content root.
    Link {
        /// Display label.
        label: String,
        /// Target URL.
        url: String,
    },
    /// Section with ordered children.
    Section {
        /// Display label.
        label: String,
        /// Child entries in declared order.
        children: Vec<NavNode>,
    },
}

impl NavNode {
    /// Create a labelled page leaf.
    #[must_use]
    pub fn page(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Page {
            label: Some(label.into()),
            path: path.into(),
        }
    }

    /// Create a section.
    #[must_use]
    pub fn section(label: impl Into<String>, children: Vec<NavNode>) -> Self {
        Self::Section {
            label: label.into(),
            children,
        }
    }

    /// Label declared in the configuration, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Page { label, .. } => label.as_deref(),
            Self::Link { label, .. } | Self::Section { label, .. } => Some(label),
        }
    }

    /// Number of page leaves in this subtree.
    #[must_use]
    pub fn page_count(&self) -> usize {
        match self {
            Self::Page { .. } => 1,
            Self::Link { .. } => 0,
            Self::Section { children, .. } => children.iter().map(Self::page_count).sum(),
        }
    }
}

/// Parse the `nav` value into a list of top-level nodes.
pub(crate) fn parse_nav(value: &Value) -> Result<Vec<NavNode>, ConfigError> {
    let Value::Array(entries) = value else {
        return Err(ConfigError::invalid("nav", "expected a list of entries"));
    };
    parse_entries(entries, "nav")
}

fn parse_entries(entries: &[Value], key: &str) -> Result<Vec<NavNode>, ConfigError> {
    let nodes = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(entry, &format!("{key}[{index}]")))
        .collect::<Result<Vec<_>, _>>()?;

    warn_duplicate_labels(&nodes, key);
    Ok(nodes)
}

fn parse_entry(entry: &Value, key: &str) -> Result<NavNode, ConfigError> {
    match entry {
        Value::String(path) => {
            if is_url(path) {
                return Err(ConfigError::invalid(
                    key,
                    "external links need a label (`Label: url`)",
                ));
            }
            validate_page_path(path, key)?;
            Ok(NavNode::Page {
                label: None,
                path: path.clone(),
            })
        }
        Value::Object(map) => {
            let mut iter = map.iter();
            let (Some((label, target)), None) = (iter.next(), iter.next()) else {
                return Err(ConfigError::invalid(
                    key,
                    "expected a single `label: target` mapping",
                ));
            };
            let key = format!("{key}.{label}");
            match target {
                Value::String(target) if is_url(target) => Ok(NavNode::Link {
                    label: label.clone(),
                    url: target.clone(),
                }),
                Value::String(path) => {
                    validate_page_path(path, &key)?;
                    Ok(NavNode::page(label.clone(), path.clone()))
                }
                Value::Array(children) => Ok(NavNode::section(
                    label.clone(),
                    parse_entries(children, &key)?,
                )),
                _ => Err(ConfigError::invalid(
                    &key,
                    "expected a page path, a URL or a list of entries",
                )),
            }
        }
        _ => Err(ConfigError::invalid(
            key,
            "expected a page path or a `label: target` mapping",
        )),
    }
}

fn is_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with("mailto:")
}

/// Nav paths are relative, stay inside the content root and name Markdown files.
fn validate_page_path(path: &str, key: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::invalid(key, "page path cannot be empty"));
    }
    if !(path.ends_with(".md") || path.ends_with(".markdown")) {
        return Err(ConfigError::invalid(
            key,
            format!("`{path}` is not a Markdown file"),
        ));
    }

    let mut depth: usize = 0;
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ConfigError::invalid(key, format!("`{path}` escapes the content root"))
                })?;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::invalid(
                    key,
                    format!("`{path}` must be relative to the content root"),
                ));
            }
        }
    }
    Ok(())
}

fn warn_duplicate_labels(nodes: &[NavNode], key: &str) {
    let mut seen = std::collections::HashSet::new();
    for label in nodes.iter().filter_map(NavNode::label) {
        if !seen.insert(label) {
            tracing::warn!(key, label, "Duplicate navigation label");
        }
    }
}
