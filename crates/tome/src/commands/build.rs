//! `tome build` command implementation.

use std::path::PathBuf;

use clap::Args;
use tome_config::{CliSettings, SiteConfig};
use tome_site::SiteBuilder;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover tome.yml).
    #[arg(short, long, env = "TOME_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Content root directory (overrides config).
    #[arg(short = 's', long)]
    content_root: Option<PathBuf>,

    /// Remove the output directory before building.
    #[arg(long)]
    clean: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, content is missing, output
    /// cannot be written, or any page failed to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            output_dir: self.output_dir,
            content_root: self.content_root,
            ..CliSettings::default()
        };
        let config = SiteConfig::load(self.config.as_deref(), Some(&cli_settings))?;

        output.field("Source", config.content_root.display());
        output.field("Output", config.output_dir.display());

        let mut builder = SiteBuilder::new(config)?;
        let report = builder.build(self.clean)?;
        output.report(&report);

        if !report.is_success() {
            return Err(CliError::PagesFailed {
                failed: report.failed.len(),
            });
        }
        output.success(&format!(
            "Site built successfully to {}",
            builder.config().output_dir.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn args(config: &Path) -> BuildArgs {
        BuildArgs {
            config: Some(config.to_path_buf()),
            output_dir: None,
            content_root: None,
            clean: false,
            verbose: false,
        }
    }

    #[test]
    fn test_build_writes_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Welcome\n").unwrap();
        let config = dir.path().join("tome.yml");
        fs::write(&config, "site_name: Notes\nnav:\n  - Home: index.md\n").unwrap();

        args(&config).execute().unwrap();

        let html = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
        assert!(html.contains("Welcome"));
    }

    #[test]
    fn test_build_output_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Welcome\n").unwrap();
        let config = dir.path().join("tome.yml");
        fs::write(&config, "site_name: Notes\n").unwrap();

        let mut args = args(&config);
        args.output_dir = Some(dir.path().join("public"));
        args.execute().unwrap();

        assert!(dir.path().join("public/index.html").exists());
        assert!(!dir.path().join("site").exists());
    }

    #[test]
    fn test_failed_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Welcome\n").unwrap();
        fs::write(dir.path().join("docs/bad.md"), "---\ntitle: [\n---\n").unwrap();
        let config = dir.path().join("tome.yml");
        fs::write(
            &config,
            "site_name: Notes\nnav:\n  - index.md\n  - bad.md\n",
        )
        .unwrap();

        let err = args(&config).execute().unwrap_err();
        assert!(matches!(err, CliError::PagesFailed { failed: 1 }));
        assert!(dir.path().join("site/index.html").exists());
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        let config = dir.path().join("tome.yml");
        fs::write(&config, "site_name: Notes\nnav:\n  - gone.md\n").unwrap();

        let err = args(&config).execute().unwrap_err();
        assert_eq!(err.to_string(), "Missing content: gone.md");
    }
}
