//! CLI error types.

use tome_config::ConfigError;
use tome_server::ServerError;
use tome_site::{BuildError, WatchError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{failed} page(s) failed to render")]
    PagesFailed { failed: usize },
}
