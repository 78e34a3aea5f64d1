//! Markdown extension selection from `markdown_extensions`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tome_config::{ConfigError, SiteConfig};
use tome_renderer::{Extension, MarkdownOptions};

/// Build renderer options from the configured extension list.
///
/// Unknown extensions are logged and skipped. Order in the configuration does
/// not matter: the renderer always runs stages in pipeline order.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming `markdown_extensions[i]` when an
/// extension's options have the wrong shape.
pub fn markdown_options(config: &SiteConfig) -> Result<MarkdownOptions, ConfigError> {
    let mut options = MarkdownOptions::default();

    for (i, entry) in config.markdown_extensions.iter().enumerate() {
        let Some(ext) = Extension::from_name(&entry.name) else {
            tracing::warn!(extension = %entry.name, "Unknown markdown extension, ignoring");
            continue;
        };
        options.enable(ext);

        let key = format!("markdown_extensions[{i}]");
        match ext {
            Extension::SuperFences => options.superfences = parse(&entry.options, &key)?,
            Extension::Highlight => options.highlight = parse(&entry.options, &key)?,
            Extension::TaskList => options.tasklist = parse(&entry.options, &key)?,
            Extension::Toc => options.toc = parse(&entry.options, &key)?,
            _ => {
                if !entry.options.is_empty() {
                    tracing::debug!(extension = %entry.name, "Extension options ignored");
                }
            }
        }
    }

    tracing::debug!(
        extensions = ?options.enabled().map(Extension::name).collect::<Vec<_>>(),
        "Markdown extensions enabled"
    );
    Ok(options)
}

fn parse<T: DeserializeOwned>(options: &Map<String, Value>, key: &str) -> Result<T, ConfigError> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| ConfigError::Invalid {
        key: key.to_owned(),
        message: e.to_string(),
    })
}
