//! Search index: page source path → location, title and plain-text tokens.
//!
//! Written once per build as `search/search_index.json`:
//!
//! ```json
//! {"config": {"lang": ["en"], "separator": "[\\s\\-]+"},
//!  "docs": {"php/arrays.md": {"location": "php/arrays/", "title": "Arrays",
//!                              "tokens": ["arrays", "are", "maps"]}}}
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WriteError;

/// Index location relative to the output directory.
pub const SEARCH_INDEX_PATH: &str = "search/search_index.json";

const DEFAULT_SEPARATOR: &str = r"[\s\-]+";

static DEFAULT_SEPARATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_SEPARATOR).expect("invalid default separator"));

/// `search` plugin options.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    separator: Regex,
    lang: Vec<String>,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawOptions {
    separator: String,
    lang: OneOrMany,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_owned(),
            lang: OneOrMany::Many(vec!["en".to_owned()]),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR_PATTERN.clone(),
            lang: vec!["en".to_owned()],
        }
    }
}

impl SearchOptions {
    /// Create options with a token separator pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `separator` is not a valid pattern.
    pub fn new(separator: &str, lang: Vec<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            separator: Regex::new(separator)?,
            lang,
        })
    }

    /// Parse plugin options. The error is a human-readable message.
    pub(crate) fn from_options(options: &Map<String, Value>) -> Result<Self, String> {
        let raw: RawOptions =
            serde_json::from_value(Value::Object(options.clone())).map_err(|e| e.to_string())?;
        let lang = match raw.lang {
            OneOrMany::One(lang) => vec![lang],
            OneOrMany::Many(langs) => langs,
        };
        Self::new(&raw.separator, lang).map_err(|e| format!("invalid separator: {e}"))
    }

    /// Split text into lowercase tokens, first occurrence order, no duplicates.
    ///
    /// Punctuation at token edges is dropped.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.separator
            .split(text)
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .filter(|word| seen.insert(word.clone()))
            .collect()
    }
}

/// Indexed page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchDoc {
    /// Page URL relative to the site root.
    pub location: String,
    pub title: String,
    pub tokens: Vec<String>,
}

#[derive(Serialize)]
struct IndexConfig<'a> {
    lang: &'a [String],
    separator: &'a str,
}

#[derive(Serialize)]
struct IndexFile<'a> {
    config: IndexConfig<'a>,
    docs: &'a BTreeMap<String, SearchDoc>,
}

/// Search index accumulated across a build.
#[derive(Clone, Debug, Default)]
pub struct SearchIndex {
    options: SearchOptions,
    docs: BTreeMap<String, SearchDoc>,
}

impl SearchIndex {
    #[must_use]
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            docs: BTreeMap::new(),
        }
    }

    /// Index a page, replacing any previous entry for `source`.
    pub fn add(&mut self, source: &str, url: &str, title: &str, text: &str) {
        let doc = SearchDoc {
            location: url.to_owned(),
            title: title.to_owned(),
            tokens: self.options.tokenize(text),
        };
        self.docs.insert(source.to_owned(), doc);
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<&SearchDoc> {
        self.docs.get(source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Serialize the index.
    #[must_use]
    pub fn to_json(&self) -> String {
        let file = IndexFile {
            config: IndexConfig {
                lang: &self.options.lang,
                separator: self.options.separator.as_str(),
            },
            docs: &self.docs,
        };
        // Plain strings and maps always serialize.
        serde_json::to_string(&file).unwrap_or_default()
    }

    /// Write the index to [`SEARCH_INDEX_PATH`] under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the file cannot be written.
    pub fn write(&self, output_dir: &Path) -> Result<(), WriteError> {
        let path = output_dir.join(SEARCH_INDEX_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WriteError::new(parent, e))?;
        }
        fs::write(&path, self.to_json()).map_err(|e| WriteError::new(&path, e))?;
        tracing::debug!(docs = self.docs.len(), path = %path.display(), "Wrote search index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tokenize_default_separator() {
        let options = SearchOptions::default();
        assert_eq!(
            options.tokenize("Arrays are ordered-maps. Arrays, arrays!"),
            ["arrays", "are", "ordered", "maps"]
        );
    }

    #[test]
    fn test_tokenize_custom_separator() {
        let options = SearchOptions::new(r"[\s\-\.]+", vec!["en".to_owned()]).unwrap();
        assert_eq!(options.tokenize("array.map x-y"), ["array", "map", "x", "y"]);
    }

    #[test]
    fn test_options_from_plugin_entry() {
        let options = SearchOptions::from_options(
            json!({"separator": "[\\s]+", "lang": "de"}).as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(options.lang, ["de"]);
        assert_eq!(options.tokenize("a-b c"), ["a-b", "c"]);
    }

    #[test]
    fn test_invalid_separator() {
        let err = SearchOptions::from_options(json!({"separator": "("}).as_object().unwrap())
            .unwrap_err();
        assert!(err.starts_with("invalid separator"));
    }

    #[test]
    fn test_index_json() {
        let mut index = SearchIndex::default();
        index.add("php/arrays.md", "php/arrays/", "Arrays", "Arrays hold values");
        index.add("index.md", "", "Home", "Welcome");

        let value: Value = serde_json::from_str(&index.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "config": {"lang": ["en"], "separator": "[\\s\\-]+"},
                "docs": {
                    "index.md": {"location": "", "title": "Home", "tokens": ["welcome"]},
                    "php/arrays.md": {
                        "location": "php/arrays/",
                        "title": "Arrays",
                        "tokens": ["arrays", "hold", "values"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_add_replaces_entry() {
        let mut index = SearchIndex::default();
        index.add("a.md", "a/", "A", "old");
        index.add("a.md", "a/", "A", "new");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.md").unwrap().tokens, ["new"]);
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = SearchIndex::default();
        index.add("index.md", "", "Home", "hello");
        index.write(dir.path()).unwrap();
        let written = fs::read_to_string(dir.path().join(SEARCH_INDEX_PATH)).unwrap();
        assert_eq!(written, index.to_json());
    }
}
