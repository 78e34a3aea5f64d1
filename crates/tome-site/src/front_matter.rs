//! Front-matter parsing.
//!
//! A content file may start with a YAML block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Arrays
//! tags: [php, basics]
//! ---
//! # Arrays
//! ```
//!
//! The block closes with `---` or `...`. Keys other than the known ones are
//! kept in [`FrontMatter::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed front-matter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    /// Page title (overrides the first H1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Icon shown next to the page in navigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Meta description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags collected by the `tags` plugin.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Template parts to hide (`navigation`, `toc`, `footer`, `tags`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hide: Vec<String>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FrontMatter {
    /// Check whether a template part is hidden on this page.
    #[must_use]
    pub fn hides(&self, part: &str) -> bool {
        self.hide.iter().any(|h| h == part)
    }
}

/// Front-matter parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontMatterError {
    /// Opening `---` without a closing delimiter.
    #[error("unterminated front-matter block opened on line {line}")]
    Unterminated {
        /// Line of the opening delimiter.
        line: usize,
    },
    /// Block is not valid YAML or has the wrong shape.
    #[error("invalid front-matter{}: {message}", line.map_or_else(String::new, |l| format!(" on line {l}")))]
    Invalid {
        /// 1-based line in the file, when known.
        line: Option<usize>,
        /// Parser message.
        message: String,
    },
}

impl FrontMatterError {
    /// 1-based line the error points at, when known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Unterminated { line } => Some(*line),
            Self::Invalid { line, .. } => *line,
        }
    }
}

/// A content file split into front-matter and Markdown body.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    pub front_matter: FrontMatter,
    pub body: &'a str,
    /// 1-based line of the file where `body` starts.
    pub body_line: usize,
}

/// Split a content file into front-matter and body.
///
/// # Errors
///
/// Returns [`FrontMatterError`] when the block is unterminated or not a YAML
/// mapping of the expected shape.
pub fn parse_document(text: &str) -> Result<Document<'_>, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let plain = Document {
        front_matter: FrontMatter::default(),
        body: text,
        body_line: 1,
    };

    let Some(first_end) = text.find('\n') else {
        return Ok(plain);
    };
    if text[..first_end].trim_end() != "---" {
        return Ok(plain);
    }

    let mut offset = first_end + 1;
    let mut line = 2;
    loop {
        if offset >= text.len() {
            return Err(FrontMatterError::Unterminated { line: 1 });
        }
        let end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
        let current = text[offset..end].trim_end();
        if current == "---" || current == "..." {
            let yaml = &text[first_end + 1..offset];
            let body_start = (end + 1).min(text.len());
            return Ok(Document {
                front_matter: parse_yaml(yaml)?,
                body: &text[body_start..],
                body_line: line + 1,
            });
        }
        offset = end + 1;
        line += 1;
    }
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Invalid {
        // The block starts on line 2 of the file.
        line: e.location().map(|loc| loc.line() + 1),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_front_matter() {
        let doc = parse_document("# Title\n\nText\n").unwrap();
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "# Title\n\nText\n");
        assert_eq!(doc.body_line, 1);
    }

    #[test]
    fn test_known_and_extra_keys() {
        let text = "---\ntitle: Arrays\nicon: material/code-array\ntags: [php, basics]\nhide:\n  - toc\nweight: 3\n---\n# Body\n";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.front_matter.title.as_deref(), Some("Arrays"));
        assert_eq!(doc.front_matter.icon.as_deref(), Some("material/code-array"));
        assert_eq!(doc.front_matter.tags, ["php", "basics"]);
        assert!(doc.front_matter.hides("toc"));
        assert!(!doc.front_matter.hides("navigation"));
        assert_eq!(doc.front_matter.extra.get("weight"), Some(&Value::from(3)));
        assert_eq!(doc.body, "# Body\n");
        assert_eq!(doc.body_line, 9);
    }

    #[test]
    fn test_dots_close_block() {
        let doc = parse_document("---\ntitle: A\n...\nBody").unwrap();
        assert_eq!(doc.body, "Body");
        assert_eq!(doc.body_line, 4);
    }

    #[test]
    fn test_empty_block() {
        let doc = parse_document("---\n---\nBody\n").unwrap();
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "Body\n");
    }

    #[test]
    fn test_block_at_end_of_file() {
        let doc = parse_document("---\ntitle: A\n---").unwrap();
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_crlf_and_bom() {
        let doc = parse_document("\u{feff}---\r\ntitle: A\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(doc.front_matter.title.as_deref(), Some("A"));
        assert_eq!(doc.body, "Body\r\n");
    }

    #[test]
    fn test_unterminated() {
        let err = parse_document("---\ntitle: A\n\nBody\n").unwrap_err();
        assert_eq!(err, FrontMatterError::Unterminated { line: 1 });
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_invalid_yaml_reports_file_line() {
        let err = parse_document("---\ntitle: A\ntags: [a\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Invalid { .. }));
        assert!(err.line().is_some_and(|line| line >= 3));
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_document("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Invalid { .. }));
    }

    #[test]
    fn test_thematic_break_later_is_not_front_matter() {
        let doc = parse_document("Intro\n\n---\n\nMore\n").unwrap();
        assert_eq!(doc.body_line, 1);
        assert_eq!(doc.front_matter, FrontMatter::default());
    }
}
