//! Theme assets compiled into the binary and copied into every build.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::WriteError;

pub const MAIN_CSS: &str = "assets/stylesheets/main.css";
pub const THEME_JS: &str = "assets/javascripts/theme.js";
pub const SEARCH_JS: &str = "assets/javascripts/search.js";

#[derive(rust_embed::RustEmbed)]
#[folder = "theme/"]
#[prefix = ""]
struct Theme;

/// Contents of a theme asset, by path relative to the output directory.
pub fn get(path: &str) -> Option<Cow<'static, [u8]>> {
    Theme::get(path).map(|file| file.data)
}

/// Paths of all theme assets.
pub fn iter() -> impl Iterator<Item = Cow<'static, str>> {
    Theme::iter()
}

/// Write every theme asset under `output_dir`. Returns the number written.
///
/// # Errors
///
/// Returns [`WriteError`] if a file or directory cannot be created.
pub fn write_assets(output_dir: &Path) -> Result<usize, WriteError> {
    let mut count = 0;
    for name in iter() {
        let Some(data) = get(&name) else {
            continue;
        };
        let path = output_dir.join(name.as_ref());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WriteError::new(parent, e))?;
        }
        fs::write(&path, data).map_err(|e| WriteError::new(&path, e))?;
        count += 1;
    }
    tracing::debug!(count, "Wrote theme assets");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_assets_exist() {
        for path in [MAIN_CSS, THEME_JS, SEARCH_JS] {
            assert!(get(path).is_some(), "{path} missing");
        }
    }

    #[test]
    fn test_write_assets() {
        let dir = tempfile::tempdir().unwrap();
        let count = write_assets(dir.path()).unwrap();
        assert_eq!(count, iter().count());
        let css = fs::read_to_string(dir.path().join(MAIN_CSS)).unwrap();
        assert!(css.contains(".md-header"));
    }
}
