//! Markdown extension selection and per-extension options.

use std::collections::BTreeSet;

/// Markdown extensions understood by the renderer.
///
/// Variant order is pipeline order: stages always run in this order no matter
/// how the configuration lists them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    /// `!!! type "Title"` call-out blocks.
    Admonition,
    /// `??? type` collapsible blocks.
    Details,
    /// `=== "Label"` content tabs.
    Tabbed,
    /// Nested fences and custom fence renderers.
    SuperFences,
    /// Code block titles, line numbers and highlighted lines.
    Highlight,
    /// `` `#!lang code` `` inline code.
    InlineHilite,
    /// Pipe tables.
    Tables,
    /// `- [x]` task lists.
    TaskList,
    /// `[^1]` footnotes.
    Footnotes,
    /// Definition lists.
    DefList,
    /// `:shortcode:` emoji and icons.
    Emoji,
    /// Heading permalinks and table of contents depth.
    Toc,
}

impl Extension {
    /// All extensions in pipeline order.
    pub const ALL: [Self; 12] = [
        Self::Admonition,
        Self::Details,
        Self::Tabbed,
        Self::SuperFences,
        Self::Highlight,
        Self::InlineHilite,
        Self::Tables,
        Self::TaskList,
        Self::Footnotes,
        Self::DefList,
        Self::Emoji,
        Self::Toc,
    ];

    /// Configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Admonition => "admonition",
            Self::Details => "pymdownx.details",
            Self::Tabbed => "pymdownx.tabbed",
            Self::SuperFences => "pymdownx.superfences",
            Self::Highlight => "pymdownx.highlight",
            Self::InlineHilite => "pymdownx.inlinehilite",
            Self::Tables => "tables",
            Self::TaskList => "pymdownx.tasklist",
            Self::Footnotes => "footnotes",
            Self::DefList => "def_list",
            Self::Emoji => "pymdownx.emoji",
            Self::Toc => "toc",
        }
    }

    /// Look up an extension by configuration name.
    ///
    /// The `markdown.extensions.` prefix used by long-form names is accepted.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("markdown.extensions.").unwrap_or(name);
        Self::ALL.into_iter().find(|ext| ext.name() == name)
    }
}

/// Enabled extensions with their options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    enabled: BTreeSet<Extension>,
    /// `pymdownx.superfences` options.
    pub superfences: SuperFencesOptions,
    /// `pymdownx.highlight` options.
    pub highlight: HighlightOptions,
    /// `pymdownx.tasklist` options.
    pub tasklist: TaskListOptions,
    /// `toc` options.
    pub toc: TocOptions,
}

impl MarkdownOptions {
    /// Options with every extension enabled at default settings.
    #[must_use]
    pub fn all() -> Self {
        let mut options = Self::default();
        for ext in Extension::ALL {
            options.enable(ext);
        }
        options
    }

    /// Enable an extension.
    pub fn enable(&mut self, ext: Extension) {
        self.enabled.insert(ext);
    }

    /// Disable an extension.
    pub fn disable(&mut self, ext: Extension) {
        self.enabled.remove(&ext);
    }

    /// Check whether an extension is enabled.
    #[must_use]
    pub fn is_enabled(&self, ext: Extension) -> bool {
        self.enabled.contains(&ext)
    }

    /// Enabled extensions in pipeline order.
    pub fn enabled(&self) -> impl Iterator<Item = Extension> + '_ {
        self.enabled.iter().copied()
    }
}

/// `pymdownx.superfences` options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct SuperFencesOptions {
    /// Fence languages rendered as diagram containers instead of code.
    pub custom_fences: Vec<CustomFence>,
}

/// A custom fence: code in a fence named `name` is emitted verbatim inside
/// `<pre class="{class}">` for client-side rendering (e.g. Mermaid).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct CustomFence {
    /// Fence language.
    pub name: String,
    /// CSS class of the container.
    pub class: String,
}

/// `pymdownx.highlight` options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct HighlightOptions {
    /// Number lines of every code block.
    pub linenums: bool,
}

/// `pymdownx.tasklist` options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct TaskListOptions {
    /// Render styled checkboxes instead of native inputs.
    pub custom_checkbox: bool,
    /// Leave checkboxes enabled.
    pub clickable_checkbox: bool,
}

/// `toc` options.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct TocOptions {
    /// Anchor appended to headings.
    pub permalink: Permalink,
    /// Tooltip of the anchor.
    pub permalink_title: String,
    /// Deepest heading level listed in the table of contents.
    pub toc_depth: u8,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            permalink: Permalink::Enabled(false),
            permalink_title: "Permanent link".to_owned(),
            toc_depth: 6,
        }
    }
}

/// Heading permalink: `true` for the default `¶`, or a custom symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(untagged))]
pub enum Permalink {
    /// Default symbol when `true`, no permalink when `false`.
    Enabled(bool),
    /// Custom anchor text.
    Symbol(String),
}

impl Permalink {
    /// Anchor text, `None` when permalinks are off.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Enabled(true) => Some("¶"),
            Self::Enabled(false) => None,
            Self::Symbol(symbol) => Some(symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_names_round_trip() {
        for ext in Extension::ALL {
            assert_eq!(Extension::from_name(ext.name()), Some(ext));
        }
    }

    #[test]
    fn test_extension_long_name() {
        assert_eq!(
            Extension::from_name("markdown.extensions.toc"),
            Some(Extension::Toc)
        );
        assert_eq!(Extension::from_name("attr_list"), None);
    }

    #[test]
    fn test_enabled_in_pipeline_order() {
        let mut options = MarkdownOptions::default();
        options.enable(Extension::Toc);
        options.enable(Extension::Tabbed);
        options.enable(Extension::Admonition);
        let order: Vec<_> = options.enabled().collect();
        assert_eq!(
            order,
            [Extension::Admonition, Extension::Tabbed, Extension::Toc]
        );
    }

    #[test]
    fn test_permalink_symbol() {
        assert_eq!(Permalink::Enabled(true).symbol(), Some("¶"));
        assert_eq!(Permalink::Enabled(false).symbol(), None);
        assert_eq!(Permalink::Symbol("#".to_owned()).symbol(), Some("#"));
    }
}
