//! Theme options.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Theme configuration (`theme:` key).
///
/// Accepts either a bare theme name (`theme: material`) or a mapping with
/// palette, font, feature and icon options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme name.
    pub name: String,
    /// Interface language (`lang` attribute of rendered pages).
    pub language: String,
    /// Palette variants. The first one is the default; the rest are
    /// alternatives offered through a toggle.
    #[serde(deserialize_with = "one_or_many")]
    pub palette: Vec<PaletteVariant>,
    /// Font choices.
    pub font: FontConfig,
    /// Enabled feature flags (e.g. `navigation.footer`, `content.code.copy`).
    pub features: Vec<String>,
    /// Icon overrides.
    pub icon: IconConfig,
    /// Logo image path, relative to the content root.
    pub logo: Option<String>,
    /// Favicon path, relative to the content root.
    pub favicon: Option<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "material".to_owned(),
            language: "en".to_owned(),
            palette: Vec::new(),
            font: FontConfig::default(),
            features: Vec::new(),
            icon: IconConfig::default(),
            logo: None,
            favicon: None,
        }
    }
}

impl ThemeConfig {
    /// Create a theme with defaults and the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check whether a feature flag is enabled.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Default palette variant, if any palette is configured.
    #[must_use]
    pub fn default_palette(&self) -> Option<&PaletteVariant> {
        self.palette.first()
    }
}

/// One palette variant (color scheme plus primary/accent colors).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaletteVariant {
    /// Color scheme (`default` or `slate`).
    pub scheme: Option<String>,
    /// Primary color name.
    pub primary: Option<String>,
    /// Accent color name.
    pub accent: Option<String>,
    /// Media query selecting this variant automatically.
    pub media: Option<String>,
    /// Toggle shown to switch to the next variant.
    pub toggle: Option<PaletteToggle>,
}

/// Palette toggle button.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaletteToggle {
    /// Icon shortcode for the toggle.
    pub icon: Option<String>,
    /// Accessible label.
    pub name: Option<String>,
}

/// Font configuration: `font: false` disables web fonts, a mapping selects
/// the text and code fonts.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FontConfig {
    /// `true` keeps the default fonts, `false` uses system fonts.
    Toggle(bool),
    /// Explicit font families.
    Fonts {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
}

const DEFAULT_TEXT_FONT: &str = "Roboto";
const DEFAULT_CODE_FONT: &str = "Roboto Mono";

impl Default for FontConfig {
    fn default() -> Self {
        Self::Toggle(true)
    }
}

impl FontConfig {
    /// Text font family, `None` when web fonts are disabled.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Toggle(true) => Some(DEFAULT_TEXT_FONT),
            Self::Toggle(false) => None,
            Self::Fonts { text, .. } => Some(text.as_deref().unwrap_or(DEFAULT_TEXT_FONT)),
        }
    }

    /// Code font family, `None` when web fonts are disabled.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Toggle(true) => Some(DEFAULT_CODE_FONT),
            Self::Toggle(false) => None,
            Self::Fonts { code, .. } => Some(code.as_deref().unwrap_or(DEFAULT_CODE_FONT)),
        }
    }
}

/// Icon overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Logo icon shortcode (used when no logo image is set).
    pub logo: Option<String>,
    /// Repository icon shortcode.
    pub repo: Option<String>,
    /// Admonition type → icon shortcode.
    pub admonition: BTreeMap<String, String>,
}

/// Accept a single mapping or a list of mappings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PaletteVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PaletteVariant),
        Many(Vec<PaletteVariant>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(variant) => vec![variant],
        OneOrMany::Many(variants) => variants,
    })
}
