//! Configuration management for Tome.
//!
//! Loads the site configuration document (`tome.yml`, `tome.toml` or an
//! existing `mkdocs.yml`) into a validated [`SiteConfig`] and its navigation
//! tree ([`NavNode`]). When no path is given, the first recognised file in the
//! current directory or one of its parents is used.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` and `${VAR:-default}` in these fields:
//! - `site_url`
//! - `site_author`
//! - `copyright`
//! - `repo_url`
//!
//! ## Errors
//!
//! Every [`ConfigError`] produced while reading the document names the key it
//! concerns, down to nested navigation entries (`nav[1].PHP[0]`).

mod document;
mod expand;
mod nav;
mod theme;

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};

pub use document::{ConfigFormat, NamedEntry};
pub use nav::NavNode;
pub use theme::{FontConfig, IconConfig, PaletteToggle, PaletteVariant, ThemeConfig};

use document::{parse_named_list, take_aliased, take_field};
use expand::expand_optional;

/// Configuration file names searched for, in order of preference.
const CONFIG_FILENAMES: &[&str] = &["tome.yml", "tome.yaml", "tome.toml", "mkdocs.yml"];

/// Plugin enabled when the `plugins` key is absent.
const DEFAULT_PLUGIN: &str = "search";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override content root.
    pub content_root: Option<PathBuf>,
    /// Override dev server host.
    pub host: Option<String>,
    /// Override dev server port.
    pub port: Option<u16>,
}

/// Validated site configuration.
///
/// Created once at load time and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    /// Site name shown in the header and page titles.
    pub site_name: String,
    /// Canonical site URL.
    pub site_url: Option<String>,
    /// Author meta tag.
    pub site_author: Option<String>,
    /// Description meta tag.
    pub site_description: Option<String>,
    /// Footer copyright notice.
    pub copyright: Option<String>,
    /// Source repository URL.
    pub repo_url: Option<String>,
    /// Source repository display name.
    pub repo_name: Option<String>,
    /// Theme options.
    pub theme: ThemeConfig,
    /// Enabled Markdown extensions in declared order.
    pub markdown_extensions: Vec<NamedEntry>,
    /// Enabled plugins in declared order.
    pub plugins: Vec<NamedEntry>,
    /// Navigation tree. `None` means "derive from the content root".
    pub nav: Option<Vec<NavNode>>,
    /// Extra stylesheets linked from every page.
    pub extra_css: Vec<String>,
    /// Extra scripts linked from every page.
    pub extra_javascript: Vec<String>,
    /// Render `page.md` as `page/index.html` (true) or `page.html` (false).
    pub use_directory_urls: bool,
    /// Additional directories watched by `serve` (absolute).
    pub watch: Vec<PathBuf>,
    /// Free-form values available to the theme.
    pub extra: Map<String, Value>,
    /// Base directory for resolving nav paths (absolute).
    pub content_root: PathBuf,
    /// Destination for the rendered site (absolute).
    pub output_dir: PathBuf,
    /// Development server settings.
    pub server: ServerConfig,
    /// Path to the config file this was loaded from.
    pub config_path: Option<PathBuf>,
}

/// Development server address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Parse a `host:port` address (the `dev_addr` key).
    fn parse(addr: &str) -> Result<Self, ConfigError> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::invalid("dev_addr", "expected `host:port`"))?;
        let port = port
            .parse()
            .map_err(|_| ConfigError::invalid("dev_addr", format!("invalid port `{port}`")))?;
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// No config file given and none discovered.
    #[error("No configuration file found (looked for {})", CONFIG_FILENAMES.join(", "))]
    NotDiscovered,
    /// File extension does not map to a known format.
    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Required key is absent.
    #[error("Missing required key `{0}`")]
    Missing(String),
    /// Key present with the wrong shape or value.
    #[error("Invalid value for `{key}`: {message}")]
    Invalid {
        /// Offending key (e.g. `nav[1].PHP[0]`).
        key: String,
        /// What was wrong.
        message: String,
    },
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field (e.g. `site_url`).
        field: String,
        /// Error message (e.g. "${`SITE_HOST`} not set").
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_owned(),
            message: message.into(),
        }
    }

    /// Key the error concerns, when it concerns one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Missing(key) | Self::Invalid { key, .. } | Self::EnvVar { field: key, .. } => {
                Some(key.as_str())
            }
            _ => None,
        }
    }
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: Option<&str>, field: &str) -> Result<(), ConfigError> {
    match url {
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => Err(
            ConfigError::invalid(field, "must start with http:// or https://"),
        ),
        _ => Ok(()),
    }
}

/// Absolute form of `path` with `.` dropped and `..` folded, without touching
/// the file system.
fn lexical(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

impl SiteConfig {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// the current directory and its parents for a recognised config file.
    ///
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails
    /// validation.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::from_file(&discovered)?
        } else {
            return Err(ConfigError::NotDiscovered);
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::parse(&content, format, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text. Relative paths resolve against `base_dir`.
    pub fn parse(content: &str, format: ConfigFormat, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut doc = format.parse(content)?;

        let site_name: String =
            take_field(&mut doc, "site_name")?.ok_or_else(|| ConfigError::Missing("site_name".to_owned()))?;

        let theme = match doc.remove("theme") {
            None | Some(Value::Null) => ThemeConfig::default(),
            Some(Value::String(name)) => ThemeConfig::named(name),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ConfigError::invalid("theme", e.to_string()))?,
        };

        let markdown_extensions = match doc.remove("markdown_extensions") {
            Some(value) => parse_named_list(value, "markdown_extensions")?,
            None => Vec::new(),
        };
        let plugins = match doc.remove("plugins") {
            Some(value) => parse_named_list(value, "plugins")?,
            None => vec![NamedEntry::bare(DEFAULT_PLUGIN)],
        };
        let nav = match doc.remove("nav") {
            None | Some(Value::Null) => None,
            Some(value) => Some(nav::parse_nav(&value)?),
        };

        let content_root: Option<String> = take_aliased(&mut doc, "content_root", "docs_dir")?;
        let output_dir: Option<String> = take_aliased(&mut doc, "output_dir", "site_dir")?;
        let watch: Vec<String> = take_field(&mut doc, "watch")?.unwrap_or_default();
        let server = match take_field::<String>(&mut doc, "dev_addr")? {
            Some(addr) => ServerConfig::parse(&addr)?,
            None => ServerConfig::default(),
        };

        let mut config = Self {
            site_name,
            site_url: take_field(&mut doc, "site_url")?,
            site_author: take_field(&mut doc, "site_author")?,
            site_description: take_field(&mut doc, "site_description")?,
            copyright: take_field(&mut doc, "copyright")?,
            repo_url: take_field(&mut doc, "repo_url")?,
            repo_name: take_field(&mut doc, "repo_name")?,
            theme,
            markdown_extensions,
            plugins,
            nav,
            extra_css: take_field(&mut doc, "extra_css")?.unwrap_or_default(),
            extra_javascript: take_field(&mut doc, "extra_javascript")?.unwrap_or_default(),
            use_directory_urls: take_field(&mut doc, "use_directory_urls")?.unwrap_or(true),
            watch: watch.iter().map(|dir| base_dir.join(dir)).collect(),
            extra: take_field(&mut doc, "extra")?.unwrap_or_default(),
            content_root: base_dir.join(content_root.as_deref().unwrap_or("docs")),
            output_dir: base_dir.join(output_dir.as_deref().unwrap_or("site")),
            server,
            config_path: None,
        };

        for key in doc.keys() {
            tracing::warn!(key = %key, "Unrecognised configuration key ignored");
        }

        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(output_dir) = &settings.output_dir {
            self.output_dir.clone_from(output_dir);
        }
        if let Some(content_root) = &settings.content_root {
            self.content_root.clone_from(content_root);
        }
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_name.trim().is_empty() {
            return Err(ConfigError::invalid("site_name", "cannot be empty"));
        }
        require_http_url(self.site_url.as_deref(), "site_url")?;
        require_http_url(self.repo_url.as_deref(), "repo_url")?;
        if self.server.host.is_empty() {
            return Err(ConfigError::invalid("dev_addr", "host cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(ConfigError::invalid("dev_addr", "port cannot be 0"));
        }
        // A clean build empties the output directory.
        if lexical(&self.content_root).starts_with(lexical(&self.output_dir)) {
            return Err(ConfigError::invalid(
                "output_dir",
                "cannot be the content root or one of its parents",
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand_optional(&mut self.site_url, "site_url")?;
        expand_optional(&mut self.site_author, "site_author")?;
        expand_optional(&mut self.copyright, "copyright")?;
        expand_optional(&mut self.repo_url, "repo_url")?;
        Ok(())
    }

    /// Search for a config file in the current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            if let Some(found) = CONFIG_FILENAMES
                .iter()
                .map(|name| current.join(name))
                .find(|candidate| candidate.exists())
            {
                return Some(found);
            }
            if !current.pop() {
                return None;
            }
        }
    }
}
