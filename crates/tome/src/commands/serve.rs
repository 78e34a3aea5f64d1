//! `tome serve` command implementation.
//!
//! The initial build runs on the caller's thread. Rebuilds run on a
//! dedicated thread fed by the file watcher, and the HTTP server runs on
//! the tokio runtime until Ctrl-C.

use std::path::{Path, PathBuf};
use std::thread;

use clap::Args;
use tome_config::{CliSettings, SiteConfig};
use tome_server::{LiveReload, ServerConfig, run_server};
use tome_site::{BuildError, BuildReport, ChangeReceiver, FileChange, RebuildPlan, SiteBuilder};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover tome.yml).
    #[arg(short, long, env = "TOME_CONFIG")]
    config: Option<PathBuf>,

    /// Content root directory (overrides config).
    #[arg(short = 's', long)]
    content_root: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable live reload.
    #[arg(long)]
    no_live_reload: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the initial build aborts,
    /// or the watcher or server cannot start. Page failures are reported
    /// but do not stop the server.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = CliSettings {
            content_root: self.content_root,
            host: self.host,
            port: self.port,
            ..CliSettings::default()
        };
        let config = SiteConfig::load(self.config.as_deref(), Some(&settings))?;
        let mut builder = SiteBuilder::new(config)?;
        output.report(&builder.build(false)?);

        let config = builder.config();
        let config_path = config
            .config_path
            .as_deref()
            .map(std::path::absolute)
            .transpose()?;
        let mut roots = vec![config.content_root.clone()];
        roots.extend(config_path.clone());
        roots.extend(config.watch.iter().cloned());
        let (changes, watch_handle) = tome_site::watch(&roots, &[config.output_dir.clone()])?;

        let server_config = ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            root: config.output_dir.clone(),
        };
        output.field("Source", config.content_root.display());
        output.field("Output", config.output_dir.display());
        let live_reload = (!self.no_live_reload).then(LiveReload::new);
        output.field(
            "Live reload",
            if live_reload.is_some() { "enabled" } else { "disabled" },
        );
        output.success(&format!(
            "Serving {} on http://{}:{}/",
            config.site_name, server_config.host, server_config.port
        ));

        let rebuilder = Rebuilder {
            builder,
            config_path,
            settings,
            live_reload: live_reload.clone(),
            output: Output::new(),
        };
        let worker = thread::spawn(move || rebuilder.run(&changes));

        let result = run_server(server_config, live_reload, shutdown_signal()).await;

        // Stopping the watcher ends the rebuild loop.
        drop(watch_handle);
        if worker.join().is_err() {
            tracing::error!("Rebuild thread panicked");
        }
        result?;
        output.info("Server stopped");
        Ok(())
    }
}

/// Applies watcher batches to the site and notifies open pages.
struct Rebuilder {
    builder: SiteBuilder,
    config_path: Option<PathBuf>,
    settings: CliSettings,
    live_reload: Option<LiveReload>,
    output: Output,
}

impl Rebuilder {
    fn run(mut self, changes: &ChangeReceiver) {
        while let Some(batch) = changes.recv() {
            self.apply(&batch);
        }
        tracing::debug!("Rebuild loop stopped");
    }

    /// Rebuild for one batch of changes. Returns whether the site was
    /// republished.
    fn apply(&mut self, batch: &[FileChange]) -> bool {
        let content_root = self.builder.config().content_root.clone();
        let plan = tome_site::plan(batch, self.config_path.as_deref(), &content_root);
        let result = match &plan {
            RebuildPlan::Skip => return false,
            RebuildPlan::Reload => match self.reload() {
                Ok(result) => result,
                Err(err) => {
                    self.output.error(&format!("Configuration not reloaded: {err}"));
                    return false;
                }
            },
            RebuildPlan::Full => self.builder.build(false),
            RebuildPlan::Pages(pages) => self.builder.rebuild(pages),
        };
        tracing::info!(?plan, "Rebuilt site");

        match result {
            Ok(report) => {
                self.output.report(&report);
                if let Some(live_reload) = &self.live_reload {
                    live_reload.notify(changed_path(batch, &content_root));
                }
                true
            }
            Err(err) => {
                self.output.error(&format!("Build failed: {err}"));
                false
            }
        }
    }

    /// Load the configuration again and build with it. The previous builder
    /// stays in place if the new configuration is invalid.
    fn reload(&mut self) -> Result<Result<BuildReport, BuildError>, CliError> {
        let config = SiteConfig::load(self.config_path.as_deref(), Some(&self.settings))?;
        self.builder = SiteBuilder::new(config)?;
        self.output.info("Configuration reloaded");
        Ok(self.builder.build(false))
    }
}

/// Path reported to reload clients: the first changed file, relative to the
/// content root when inside it.
fn changed_path(batch: &[FileChange], content_root: &Path) -> String {
    batch
        .first()
        .map(|change| {
            let path = change.path.strip_prefix(content_root).unwrap_or(&change.path);
            path.to_string_lossy().into_owned()
        })
        .unwrap_or_default()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tome_site::ChangeKind;

    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(config: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("docs")).unwrap();
            fs::write(dir.path().join("docs/index.md"), "# Welcome\n").unwrap();
            fs::write(dir.path().join("docs/guide.md"), "# Guide\n\nFirst\n").unwrap();
            fs::write(dir.path().join("tome.yml"), config).unwrap();
            Self { dir }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.dir.path().join(relative)
        }

        fn rebuilder(&self, live_reload: Option<LiveReload>) -> Rebuilder {
            let config_path = self.path("tome.yml");
            let settings = CliSettings::default();
            let config = SiteConfig::load(Some(&config_path), Some(&settings)).unwrap();
            let mut builder = SiteBuilder::new(config).unwrap();
            builder.build(false).unwrap();
            Rebuilder {
                builder,
                config_path: Some(config_path),
                settings,
                live_reload,
                output: Output::new(),
            }
        }

        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.path(relative)).unwrap()
        }
    }

    const CONFIG: &str = "site_name: Notes\nnav:\n  - index.md\n  - guide.md\n";

    fn change(path: PathBuf, kind: ChangeKind) -> Vec<FileChange> {
        vec![FileChange { path, kind }]
    }

    #[test]
    fn test_edited_page_rebuilt_and_notified() {
        let fixture = Fixture::new(CONFIG);
        let live_reload = LiveReload::new();
        let mut events = live_reload.subscribe();
        let mut rebuilder = fixture.rebuilder(Some(live_reload));

        fs::write(fixture.path("docs/guide.md"), "# Guide\n\nSecond\n").unwrap();
        let applied = rebuilder.apply(&change(fixture.path("docs/guide.md"), ChangeKind::Modified));

        assert!(applied);
        assert!(fixture.read("site/guide/index.html").contains("Second"));
        assert_eq!(events.try_recv().unwrap().path, "guide.md");
    }

    #[test]
    fn test_config_change_reloads() {
        let fixture = Fixture::new(CONFIG);
        let mut rebuilder = fixture.rebuilder(None);

        fs::write(fixture.path("tome.yml"), CONFIG.replace("Notes", "Handbook")).unwrap();
        assert!(rebuilder.apply(&change(fixture.path("tome.yml"), ChangeKind::Modified)));

        assert_eq!(rebuilder.builder.config().site_name, "Handbook");
        assert!(fixture.read("site/index.html").contains("Handbook"));
    }

    #[test]
    fn test_invalid_config_keeps_previous_site() {
        let fixture = Fixture::new(CONFIG);
        let mut rebuilder = fixture.rebuilder(None);

        fs::write(fixture.path("tome.yml"), "nav: [\n").unwrap();
        assert!(!rebuilder.apply(&change(fixture.path("tome.yml"), ChangeKind::Modified)));
        assert_eq!(rebuilder.builder.config().site_name, "Notes");
    }

    #[test]
    fn test_removed_page_fails_without_notifying() {
        let fixture = Fixture::new(CONFIG);
        let live_reload = LiveReload::new();
        let mut events = live_reload.subscribe();
        let mut rebuilder = fixture.rebuilder(Some(live_reload));

        fs::remove_file(fixture.path("docs/guide.md")).unwrap();
        let applied = rebuilder.apply(&change(fixture.path("docs/guide.md"), ChangeKind::Removed));

        assert!(!applied);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_empty_batch_skipped() {
        let fixture = Fixture::new(CONFIG);
        let mut rebuilder = fixture.rebuilder(None);
        assert!(!rebuilder.apply(&[]));
    }

    #[test]
    fn test_changed_path_outside_content_root() {
        let root = Path::new("/site/docs");
        let batch = change(PathBuf::from("/site/tome.yml"), ChangeKind::Modified);
        assert_eq!(changed_path(&batch, root), "/site/tome.yml");
        assert_eq!(changed_path(&[], root), "");
    }
}
