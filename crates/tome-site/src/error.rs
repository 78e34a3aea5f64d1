//! Build-level errors.

use std::io;
use std::path::PathBuf;

use tome_config::ConfigError;

use crate::resolver::MissingContentError;

/// Failure to write into the output directory. Aborts the build.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write {}: {source}", path.display())]
pub struct WriteError {
    /// Path that could not be written.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Fatal build error. Per-page failures are reported in
/// [`BuildReport`](crate::BuildReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    MissingContent(#[from] MissingContentError),
    #[error("Failed to scan content root {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Write(#[from] WriteError),
}
