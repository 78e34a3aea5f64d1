//! Plugin selection from `plugins`.

use tome_config::{ConfigError, SiteConfig};

use crate::search::SearchOptions;

/// Enabled plugins with parsed options.
#[derive(Clone, Debug, Default)]
pub struct Plugins {
    /// Search index options, `None` when search is disabled.
    pub search: Option<SearchOptions>,
    /// Collect front-matter tags into a `tags/` page.
    pub tags: bool,
}

impl Plugins {
    /// Parse the configured plugin list. Unknown plugins are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming `plugins[i]` when a plugin's
    /// options have the wrong shape.
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        let mut plugins = Self::default();
        for (i, entry) in config.plugins.iter().enumerate() {
            match entry.name.as_str() {
                "search" => {
                    let options =
                        SearchOptions::from_options(&entry.options).map_err(|message| {
                            ConfigError::Invalid {
                                key: format!("plugins[{i}]"),
                                message,
                            }
                        })?;
                    plugins.search = Some(options);
                }
                "tags" => plugins.tags = true,
                name => tracing::warn!(plugin = %name, "Unknown plugin, ignoring"),
            }
        }
        Ok(plugins)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use pretty_assertions::assert_eq;
    use tome_config::ConfigFormat;

    fn parse(yaml: &str) -> Result<Plugins, ConfigError> {
        let config = SiteConfig::parse(yaml, ConfigFormat::Yaml, Path::new("/site")).unwrap();
        Plugins::from_config(&config)
    }

    #[test]
    fn test_search_is_default() {
        let plugins = parse("site_name: Notes\n").unwrap();
        assert!(plugins.search.is_some());
        assert!(!plugins.tags);
    }

    #[test]
    fn test_explicit_list_replaces_default() {
        let plugins = parse("site_name: Notes\nplugins:\n  - tags\n  - blog\n").unwrap();
        assert!(plugins.search.is_none());
        assert!(plugins.tags);
    }

    #[test]
    fn test_invalid_search_options_name_entry() {
        let err = parse("site_name: Notes\nplugins:\n  - tags\n  - search:\n      separator: '['\n")
            .unwrap_err();
        assert_eq!(err.key(), Some("plugins[1]"));
    }
}
