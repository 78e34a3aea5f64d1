//! File watching for `serve`: notify events → debounced batches → a
//! rebuild plan.

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use tome_renderer::is_markdown;

use crate::debouncer::{ChangeKind, Debouncer, FileChange};

const QUIET_PERIOD: Duration = Duration::from_millis(100);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The file system watcher could not be started.
#[derive(Debug, thiserror::Error)]
#[error("Failed to watch {}: {source}", path.display())]
pub struct WatchError {
    pub path: PathBuf,
    #[source]
    pub source: notify::Error,
}

/// Batches of debounced changes.
pub struct ChangeReceiver {
    rx: mpsc::Receiver<Vec<FileChange>>,
}

impl ChangeReceiver {
    /// Wait for the next batch. `None` once the watcher has stopped.
    #[must_use]
    pub fn recv(&self) -> Option<Vec<FileChange>> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next batch.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<FileChange>> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Stops the watcher when dropped.
pub struct WatchHandle {
    _shutdown: mpsc::Sender<()>,
}

/// Watch `roots` recursively. Events under any of `ignore` (typically the
/// output directory) and editor temporaries are dropped.
///
/// # Errors
///
/// Returns [`WatchError`] if the watcher cannot be created or a root cannot
/// be watched.
pub fn watch(roots: &[PathBuf], ignore: &[PathBuf]) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
    let (batch_tx, batch_rx) = mpsc::channel();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let debouncer = Arc::new(Debouncer::new(QUIET_PERIOD));

    let recorder = Arc::clone(&debouncer);
    let ignore = ignore.to_vec();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else {
            return;
        };
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            _ => return,
        };
        for path in event.paths {
            if is_relevant(&path, &ignore) {
                recorder.record(path, kind);
            }
        }
    })
    .map_err(|source| WatchError {
        path: roots.first().cloned().unwrap_or_default(),
        source,
    })?;

    for root in roots {
        let mode = if root.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode).map_err(|source| WatchError {
            path: root.clone(),
            source,
        })?;
        tracing::debug!(path = %root.display(), "Watching");
    }

    thread::spawn(move || {
        let _watcher = watcher;
        loop {
            match shutdown_rx.recv_timeout(POLL_INTERVAL) {
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            let batch = debouncer.drain_ready();
            if !batch.is_empty() && batch_tx.send(batch).is_err() {
                break;
            }
        }
        tracing::debug!("Watcher stopped");
    });

    Ok((
        ChangeReceiver { rx: batch_rx },
        WatchHandle {
            _shutdown: shutdown_tx,
        },
    ))
}

fn is_relevant(path: &Path, ignore: &[PathBuf]) -> bool {
    if ignore.iter().any(|dir| path.starts_with(dir)) {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !(name.starts_with('.') || name.ends_with('~') || name.ends_with(".swp"))
}

/// What a batch of changes requires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RebuildPlan {
    /// Nothing relevant changed.
    Skip,
    /// The configuration changed: reload it and build from scratch.
    Reload,
    /// Pages appeared or disappeared, or non-page files changed.
    Full,
    /// Only these existing pages were edited.
    Pages(Vec<PathBuf>),
}

/// Decide how to respond to a batch of changes.
#[must_use]
pub fn plan(changes: &[FileChange], config_path: Option<&Path>, content_root: &Path) -> RebuildPlan {
    if changes.is_empty() {
        return RebuildPlan::Skip;
    }
    if config_path.is_some_and(|config| changes.iter().any(|c| c.path == config)) {
        return RebuildPlan::Reload;
    }

    let mut pages = Vec::new();
    for change in changes {
        let is_page = change.path.starts_with(content_root)
            && is_markdown(&change.path.to_string_lossy());
        if !is_page || change.kind != ChangeKind::Modified {
            return RebuildPlan::Full;
        }
        pages.push(change.path.clone());
    }
    RebuildPlan::Pages(pages)
}
