//! Path and URL helpers shared by the renderer and the site builder.

use pulldown_cmark::HeadingLevel;

/// Compute a relative URL from one page URL to another (RFC 3986).
///
/// Both `from` and `to` are URL paths without leading slash. Per RFC 3986 the
/// last segment of `from` is the current document and the base directory is
/// everything before it. A trailing slash on `to` (a directory URL) is kept.
///
/// # Examples
///
/// ```
/// use tome_renderer::relative_path;
///
/// assert_eq!(relative_path("a/b", "a/c"), "c");
/// assert_eq!(relative_path("", "php/"), "php/");
/// assert_eq!(relative_path("php/arrays/", "php/"), "../");
/// ```
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    // Trailing slash means the document is empty, so all segments are the directory.
    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let remaining = &to_segs[common..];

    let mut result = format!("{}{}", "../".repeat(ups), remaining.join("/"));
    if result.is_empty() {
        return "./".to_owned();
    }
    if to.ends_with('/') && !result.ends_with('/') {
        result.push('/');
    }
    result
}

/// URL of the page rendered from a Markdown source path.
///
/// `source` is relative to the content root with `/` separators.
///
/// | source          | directory URLs | file URLs           |
/// |-----------------|----------------|---------------------|
/// | `index.md`      | ``             | `index.html`        |
/// | `php/README.md` | `php/`         | `php/index.html`    |
/// | `php/arrays.md` | `php/arrays/`  | `php/arrays.html`   |
///
/// # Examples
///
/// ```
/// use tome_renderer::page_url;
///
/// assert_eq!(page_url("php/index.md", true), "php/");
/// assert_eq!(page_url("php/arrays.md", false), "php/arrays.html");
/// ```
#[must_use]
pub fn page_url(source: &str, directory_urls: bool) -> String {
    let stem = strip_markdown_ext(source);
    let (dir, name) = match stem.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, stem),
    };

    if is_index_name(name) {
        let dir = dir.map(|d| format!("{d}/")).unwrap_or_default();
        return if directory_urls {
            dir
        } else {
            format!("{dir}index.html")
        };
    }

    if directory_urls {
        format!("{stem}/")
    } else {
        format!("{stem}.html")
    }
}

/// Output file path (relative to the output directory) for a page URL.
#[must_use]
pub fn output_path(url: &str) -> String {
    if url.is_empty() || url.ends_with('/') {
        format!("{url}index.html")
    } else {
        url.to_owned()
    }
}

/// Check whether a path names a Markdown file.
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)]
pub fn is_markdown(path: &str) -> bool {
    path.ends_with(".md") || path.ends_with(".markdown")
}

fn strip_markdown_ext(path: &str) -> &str {
    path.strip_suffix(".md")
        .or_else(|| path.strip_suffix(".markdown"))
        .unwrap_or(path)
}

fn is_index_name(name: &str) -> bool {
    name == "index" || name.eq_ignore_ascii_case("readme")
}

/// Resolve `relative` against the directory containing `source`.
///
/// Returns `None` when the result would escape the content root.
#[must_use]
pub fn resolve_relative(source: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = source.split('/').filter(|s| !s.is_empty()).collect();
    // Drop the file name.
    segments.pop();

    for component in relative.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(component),
        }
    }

    Some(segments.join("/"))
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Number of leading whitespace columns (tabs advance to the next multiple of 4).
pub(crate) fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => break,
        }
    }
    width
}

/// Remove up to `columns` columns of leading whitespace.
pub(crate) fn dedent(line: &str, columns: usize) -> &str {
    let mut width = 0;
    for (i, c) in line.char_indices() {
        if width >= columns {
            return &line[i..];
        }
        match c {
            ' ' => width += 1,
            '\t' => width += 4 - width % 4,
            _ => return &line[i..],
        }
    }
    ""
}
