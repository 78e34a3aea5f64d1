//! Content resolution: navigation leaves to files under the content root.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tome_config::NavNode;
use tome_renderer::is_markdown;

/// Directories never scanned for content.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "vendor", "__pycache__"];

/// A navigation leaf resolved to a content file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPage {
    /// Labels of the enclosing sections, outermost first.
    pub sections: Vec<String>,
    /// Leaf label. `None` for bare path entries.
    pub label: Option<String>,
    /// Source path relative to the content root, `/`-separated.
    pub source: String,
    /// Absolute path of the file.
    pub path: PathBuf,
}

impl ResolvedPage {
    /// Labels from the nav root to this page joined with `/` (`PHP/Index`).
    ///
    /// Bare entries contribute their file stem.
    #[must_use]
    pub fn trail(&self) -> String {
        let leaf = self.label.as_deref().unwrap_or_else(|| file_stem(&self.source));
        let mut trail = self.sections.join("/");
        if !trail.is_empty() {
            trail.push('/');
        }
        trail.push_str(leaf);
        trail
    }
}

/// Navigation leaves whose files do not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing content: {}", missing.join(", "))]
pub struct MissingContentError {
    /// Every unresolved path, in navigation order.
    pub missing: Vec<String>,
}

/// Resolve every page leaf of `nav` to a file under `content_root`.
///
/// Pages come back in navigation order: depth-first, children in declared
/// order. External links are skipped.
///
/// # Errors
///
/// Returns [`MissingContentError`] listing all leaves whose file does not
/// exist, not just the first.
pub fn resolve(nav: &[NavNode], content_root: &Path) -> Result<Vec<ResolvedPage>, MissingContentError> {
    let mut pages = Vec::new();
    let mut missing = Vec::new();
    walk(nav, &mut Vec::new(), content_root, &mut pages, &mut missing);

    if missing.is_empty() {
        Ok(pages)
    } else {
        Err(MissingContentError { missing })
    }
}

fn walk(
    nodes: &[NavNode],
    sections: &mut Vec<String>,
    root: &Path,
    pages: &mut Vec<ResolvedPage>,
    missing: &mut Vec<String>,
) {
    for node in nodes {
        match node {
            NavNode::Page { label, path } => {
                let source = normalize(path);
                let file = root.join(&source);
                if file.is_file() {
                    pages.push(ResolvedPage {
                        sections: sections.clone(),
                        label: label.clone(),
                        source,
                        path: file,
                    });
                } else {
                    missing.push(path.clone());
                }
            }
            NavNode::Link { .. } => {}
            NavNode::Section { label, children } => {
                sections.push(label.clone());
                walk(children, sections, root, pages, missing);
                sections.pop();
            }
        }
    }
}

/// Drop `.` segments and fold `..` (paths were validated not to escape).
pub(crate) fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Build a navigation tree from the files under `content_root`.
///
/// Used when the configuration has no `nav`. Each directory lists its
/// Markdown files by name with `index.md`/`README.md` first, followed by its
/// subdirectories as sections. Hidden and `_`-prefixed entries are skipped.
///
/// # Errors
///
/// Returns an I/O error if the content root cannot be read.
pub fn discover_nav(content_root: &Path) -> io::Result<Vec<NavNode>> {
    scan_dir(content_root, "")
}

fn scan_dir(dir: &Path, prefix: &str) -> io::Result<Vec<NavNode>> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_str()) {
                dirs.push(name);
            }
        } else if is_markdown(&name) {
            files.push(name);
        }
    }

    files.sort_by_key(|name| (!is_index(name), name.to_lowercase()));
    dirs.sort_by_key(|name| name.to_lowercase());

    let mut nodes: Vec<NavNode> = files
        .into_iter()
        .map(|name| NavNode::Page {
            label: None,
            path: format!("{prefix}{name}"),
        })
        .collect();

    for name in dirs {
        let children = scan_dir(&dir.join(&name), &format!("{prefix}{name}/"))?;
        if !children.is_empty() {
            nodes.push(NavNode::section(section_label(&name), children));
        }
    }
    Ok(nodes)
}

fn is_index(name: &str) -> bool {
    let stem = file_stem(name);
    stem == "index" || stem.eq_ignore_ascii_case("readme")
}

/// `php-basics` → `Php basics`.
fn section_label(dir_name: &str) -> String {
    let spaced = dir_name.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn file_stem(source: &str) -> &str {
    let name = source.rsplit('/').next().unwrap_or(source);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// Markdown files under `content_root` that no resolved page references.
///
/// Returned paths are relative and `/`-separated, sorted.
#[must_use]
pub fn orphans(content_root: &Path, pages: &[ResolvedPage]) -> Vec<String> {
    let referenced: HashSet<&str> = pages.iter().map(|p| p.source.as_str()).collect();
    let pattern = format!("{}/**/*.md", glob::Pattern::escape(&content_root.to_string_lossy()));
    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };

    let mut orphans: Vec<String> = paths
        .filter_map(Result::ok)
        .filter_map(|path| relative_source(content_root, &path))
        .filter(|source| !source.split('/').any(|s| s.starts_with(['.', '_'])))
        .filter(|source| !referenced.contains(source.as_str()))
        .collect();
    orphans.sort();
    orphans
}

/// `/`-separated path of `path` relative to `root`.
pub(crate) fn relative_source(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}
