//! Raw configuration documents.
//!
//! YAML and TOML documents are both normalised into a `serde_json::Value`
//! tree so that the rest of the loader can walk one representation and
//! report errors by key.

use std::borrow::Cow;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ConfigError;

/// Configuration document format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`tome.yml`, `mkdocs.yml`).
    Yaml,
    /// TOML (`tome.toml`).
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parse document text into a top-level mapping.
    pub(crate) fn parse(self, content: &str) -> Result<Map<String, Value>, ConfigError> {
        let value = match self {
            Self::Yaml => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(&localize_python_tags(content))?;
                yaml_to_json(yaml, "")?
            }
            Self::Toml => toml::from_str::<Value>(content)?,
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(ConfigError::Validation(
                "configuration document must be a mapping".to_owned(),
            )),
        }
    }
}

const PYTHON_TAG: &str = "!!python/";

/// Rewrite `!!python/...` tags as local `!python/...` tags.
///
/// libyaml expands `!!` into the core schema namespace and serde_yaml then
/// reads the node as an untagged scalar, dropping the name. Only tags that
/// open a token outside quotes are rewritten.
fn localize_python_tags(content: &str) -> Cow<'_, str> {
    if !content.contains(PYTHON_TAG) {
        return Cow::Borrowed(content);
    }
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for (idx, _) in content.match_indices(PYTHON_TAG) {
        let line = &content[content[..idx].rfind('\n').map_or(0, |n| n + 1)..idx];
        let opens_token = line
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '[' | '{' | ','));
        if opens_token && !line.contains(['"', '\'']) {
            out.push_str(&content[last..=idx]);
            last = idx + 2;
        }
    }
    out.push_str(&content[last..]);
    Cow::Owned(out)
}

/// Convert a YAML value to JSON.
///
/// Tagged values (`!!python/name:pkg.func`, `!ENV VAR`) are kept as opaque
/// strings: the tag followed by the scalar, if any.
fn yaml_to_json(value: serde_yaml::Value, key: &str) -> Result<Value, ConfigError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::from)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| yaml_to_json(item, &format!("{key}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                let name = match k {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    _ => {
                        return Err(ConfigError::invalid(
                            display_key(key),
                            "mapping keys must be scalars",
                        ));
                    }
                };
                let child_key = if key.is_empty() {
                    name.clone()
                } else {
                    format!("{key}.{name}")
                };
                map.insert(name, yaml_to_json(v, &child_key)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let mut tag = tagged.tag.to_string();
            if tag.starts_with(&PYTHON_TAG[1..]) {
                tag.insert(0, '!');
            }
            match tagged.value {
                Yaml::String(s) if !s.is_empty() => Value::String(format!("{tag} {s}")),
                Yaml::Null | Yaml::String(_) => Value::String(tag),
                other => yaml_to_json(other, key)?,
            }
        }
    })
}

fn display_key(key: &str) -> &str {
    if key.is_empty() { "<root>" } else { key }
}

/// Remove and deserialize one top-level field, naming it in errors.
///
/// `null` is treated as absent.
pub(crate) fn take_field<T: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match doc.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, e.to_string())),
    }
}

/// Remove a field that may appear under one of two names.
pub(crate) fn take_aliased<T: DeserializeOwned>(
    doc: &mut Map<String, Value>,
    key: &str,
    alias: &str,
) -> Result<Option<T>, ConfigError> {
    match take_field(doc, key)? {
        Some(value) => {
            if doc.remove(alias).is_some() {
                tracing::warn!(key, alias, "Both keys set, `{alias}` ignored");
            }
            Ok(Some(value))
        }
        None => take_field(doc, alias),
    }
}

/// An enabled extension or plugin with its options.
///
/// Written in configuration as a bare name (`- tables`) or a single-key
/// mapping (`- toc: {permalink: true}`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedEntry {
    /// Extension or plugin name.
    pub name: String,
    /// Options mapping (empty when none were given).
    pub options: Map<String, Value>,
}

impl NamedEntry {
    /// Create an entry without options.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    /// Look up an option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// Parse an ordered list of named entries.
///
/// Also accepts a mapping of `name: options`, which some configurations use
/// for plugins; mapping order is then alphabetical.
pub(crate) fn parse_named_list(value: Value, key: &str) -> Result<Vec<NamedEntry>, ConfigError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_named_entry(item, &format!("{key}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(map) => map
            .into_iter()
            .map(|(name, options)| named_with_options(name, options, key))
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ConfigError::invalid(
                key,
                "expected a list of names or `name: options` mappings",
            ));
        }
    };

    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.name.as_str()) {
            tracing::warn!(key, name = %entry.name, "Entry listed more than once");
        }
    }
    Ok(entries)
}

fn parse_named_entry(item: Value, key: &str) -> Result<NamedEntry, ConfigError> {
    match item {
        Value::String(name) if !name.trim().is_empty() => Ok(NamedEntry::bare(name)),
        Value::Object(map) if map.len() == 1 => {
            let Some((name, options)) = map.into_iter().next() else {
                return Err(ConfigError::invalid(key, "empty mapping"));
            };
            named_with_options(name, options, key)
        }
        Value::Object(_) => Err(ConfigError::invalid(
            key,
            "expected a single `name: options` mapping",
        )),
        _ => Err(ConfigError::invalid(
            key,
            "expected a name or a `name: options` mapping",
        )),
    }
}

fn named_with_options(name: String, options: Value, key: &str) -> Result<NamedEntry, ConfigError> {
    match options {
        Value::Null => Ok(NamedEntry::bare(name)),
        Value::Object(options) => Ok(NamedEntry { name, options }),
        _ => Err(ConfigError::invalid(
            &format!("{key}.{name}"),
            "options must be a mapping",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("mkdocs.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("site/tome.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("tome.ini")).is_err());
    }

    #[test]
    fn test_yaml_and_toml_agree() {
        let yaml = ConfigFormat::Yaml
            .parse("site_name: Notes\nnav:\n  - Home: index.md\n")
            .unwrap();
        let toml = ConfigFormat::Toml
            .parse("site_name = \"Notes\"\nnav = [{ Home = \"index.md\" }]\n")
            .unwrap();
        assert_eq!(yaml, toml);
    }

    #[test]
    fn test_yaml_python_tag_kept_as_string() {
        let doc = ConfigFormat::Yaml
            .parse(
                "markdown_extensions:\n  - pymdownx.emoji:\n      emoji_index: !!python/name:material.extensions.emoji.twemoji\n",
            )
            .unwrap();
        let index = &doc["markdown_extensions"][0]["pymdownx.emoji"]["emoji_index"];
        let Value::String(index) = index else {
            panic!("expected string, got {index:?}");
        };
        assert_eq!(index, "!!python/name:material.extensions.emoji.twemoji");
    }

    #[test]
    fn test_python_tag_forms() {
        let doc = ConfigFormat::Yaml
            .parse(concat!(
                "slugify: !!python/object/apply:pymdownx.slugs.slugify {kwds: {case: lower}}\n",
                "flow: [!!python/name:a.b]\n",
                "quoted: \"see !!python/name:x\"\n",
                "env: !ENV HOME\n",
            ))
            .unwrap();
        assert_eq!(doc["flow"][0], "!!python/name:a.b");
        assert_eq!(doc["quoted"], "see !!python/name:x");
        assert_eq!(doc["env"], "!ENV HOME");
        assert_eq!(doc["slugify"]["kwds"]["case"], "lower");
        assert!(matches!(
            localize_python_tags("site_name: Notes\n"),
            Cow::Borrowed("site_name: Notes\n")
        ));
    }

    #[test]
    fn test_empty_yaml_is_empty_mapping() {
        assert!(ConfigFormat::Yaml.parse("").unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        assert!(ConfigFormat::Yaml.parse("- a\n- b\n").is_err());
    }

    #[test]
    fn test_parse_named_list_mixed() {
        let entries = parse_named_list(
            json!(["tables", {"toc": {"permalink": true}}, {"admonition": null}]),
            "markdown_extensions",
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], NamedEntry::bare("tables"));
        assert_eq!(entries[1].name, "toc");
        assert_eq!(entries[1].option("permalink"), Some(&json!(true)));
        assert!(entries[2].options.is_empty());
    }

    #[test]
    fn test_parse_named_list_bad_options() {
        let err = parse_named_list(json!([{"toc": 3}]), "markdown_extensions").unwrap_err();
        assert!(err.to_string().contains("markdown_extensions[0].toc"));
    }

    #[test]
    fn test_parse_named_list_wrong_shape() {
        let err = parse_named_list(json!(["search", 5]), "plugins").unwrap_err();
        assert!(err.to_string().contains("plugins[1]"));
    }

    #[test]
    fn test_take_field_names_key() {
        let mut doc = json!({"site_url": 5}).as_object().cloned().unwrap();
        let err = take_field::<String>(&mut doc, "site_url").unwrap_err();
        assert!(err.to_string().contains("`site_url`"));
    }

    #[test]
    fn test_take_aliased_prefers_primary() {
        let mut doc = json!({"content_root": "pages", "docs_dir": "docs"})
            .as_object()
            .cloned()
            .unwrap();
        let value: Option<String> = take_aliased(&mut doc, "content_root", "docs_dir").unwrap();
        assert_eq!(value.as_deref(), Some("pages"));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_take_aliased_falls_back() {
        let mut doc = json!({"docs_dir": "docs"}).as_object().cloned().unwrap();
        let value: Option<String> = take_aliased(&mut doc, "content_root", "docs_dir").unwrap();
        assert_eq!(value.as_deref(), Some("docs"));
    }
}
