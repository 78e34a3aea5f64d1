//! Coalesces bursts of file events so one save triggers one rebuild.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// What happened to a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Combine a pending change with a newer one for the same path.
    ///
    /// `None` means the two cancel out: a file created and removed within
    /// one window never existed as far as the build is concerned.
    #[must_use]
    pub fn merge(self, newer: Self) -> Option<Self> {
        use ChangeKind::{Created, Modified, Removed};

        match (self, newer) {
            (Created, Removed) => None,
            (Created, _) | (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified | Removed, Removed) | (Removed, Modified) => Some(Removed),
            (Removed, Created) => Some(Modified),
        }
    }
}

/// A debounced change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChange {
    /// Absolute path.
    pub path: PathBuf,
    pub kind: ChangeKind,
}

struct Pending {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe per-path debouncer.
///
/// Each recorded event pushes the path's deadline out by the quiet period.
pub(crate) struct Debouncer {
    pending: Mutex<HashMap<PathBuf, Pending>>,
    quiet: Duration,
}

impl Debouncer {
    pub(crate) fn new(quiet: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    pub(crate) fn record(&self, path: PathBuf, kind: ChangeKind) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let deadline = Instant::now() + self.quiet;
        let merged = match pending.get(&path) {
            Some(existing) => existing.kind.merge(kind),
            None => Some(kind),
        };
        match merged {
            Some(kind) => {
                pending.insert(path, Pending { kind, deadline });
            }
            None => {
                pending.remove(&path);
            }
        }
    }

    /// Remove and return changes whose quiet period has passed, sorted by path.
    pub(crate) fn drain_ready(&self) -> Vec<FileChange> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let mut ready = Vec::new();
        pending.retain(|path, entry| {
            if entry.deadline <= now {
                ready.push(FileChange {
                    path: path.clone(),
                    kind: entry.kind,
                });
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use pretty_assertions::assert_eq;

    const QUIET: Duration = Duration::from_millis(10);

    fn settle() {
        thread::sleep(QUIET + Duration::from_millis(5));
    }

    #[test]
    fn test_change_held_until_quiet() {
        let debouncer = Debouncer::new(QUIET);
        debouncer.record(PathBuf::from("/docs/a.md"), ChangeKind::Modified);
        assert!(debouncer.drain_ready().is_empty());

        settle();
        assert_eq!(
            debouncer.drain_ready(),
            [FileChange {
                path: PathBuf::from("/docs/a.md"),
                kind: ChangeKind::Modified
            }]
        );
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_burst_of_saves_is_one_change() {
        let debouncer = Debouncer::new(QUIET);
        for _ in 0..5 {
            debouncer.record(PathBuf::from("/docs/a.md"), ChangeKind::Modified);
        }
        settle();
        assert_eq!(debouncer.drain_ready().len(), 1);
    }

    #[test]
    fn test_create_then_remove_cancels() {
        let debouncer = Debouncer::new(QUIET);
        debouncer.record(PathBuf::from("/docs/tmp.md"), ChangeKind::Created);
        debouncer.record(PathBuf::from("/docs/tmp.md"), ChangeKind::Removed);
        settle();
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_paths_sorted_and_independent() {
        let debouncer = Debouncer::new(QUIET);
        debouncer.record(PathBuf::from("/docs/b.md"), ChangeKind::Created);
        debouncer.record(PathBuf::from("/docs/a.md"), ChangeKind::Removed);
        settle();
        let kinds: Vec<_> = debouncer
            .drain_ready()
            .into_iter()
            .map(|c| (c.path, c.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                (PathBuf::from("/docs/a.md"), ChangeKind::Removed),
                (PathBuf::from("/docs/b.md"), ChangeKind::Created),
            ]
        );
    }

    #[test]
    fn test_merge_table() {
        use ChangeKind::{Created, Modified, Removed};

        let cases = [
            (Created, Created, Some(Created)),
            (Created, Modified, Some(Created)),
            (Created, Removed, None),
            (Modified, Created, Some(Created)),
            (Modified, Modified, Some(Modified)),
            (Modified, Removed, Some(Removed)),
            (Removed, Created, Some(Modified)),
            (Removed, Modified, Some(Removed)),
            (Removed, Removed, Some(Removed)),
        ];
        for (pending, newer, expected) in cases {
            assert_eq!(pending.merge(newer), expected, "{pending:?} + {newer:?}");
        }
    }
}
