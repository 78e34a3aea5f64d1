//! Development HTTP server for Tome.
//!
//! Serves the rendered output directory during `tome serve`:
//!
//! ```text
//! Browser ──HTTP──► axum router
//!                      ├─► /__livereload (WebSocket, when enabled)
//!                      └─► ServeDir(output_dir) ──► reload script injected into HTML
//! ```
//!
//! The site itself is built and rebuilt by the caller; after each rebuild it
//! calls [`LiveReload::notify`] so open pages refresh.

mod app;
mod error;
mod live_reload;
mod security;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;

pub use error::ServerError;
pub use live_reload::{LiveReload, ReloadEvent};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory served as the site root.
    pub root: PathBuf,
}

impl ServerConfig {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if host and port do not form a
    /// valid address.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address))
    }
}

/// Serve `config.root` until `shutdown` completes.
///
/// With `live_reload`, HTML pages reconnect to the server and reload when
/// [`LiveReload::notify`] is called.
///
/// # Errors
///
/// Returns [`ServerError`] if the address is invalid or cannot be bound.
pub async fn run_server(
    config: ServerConfig,
    live_reload: Option<LiveReload>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = config.addr()?;
    let app = app::create_router(&config.root, live_reload);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(address = %addr, root = %config.root.display(), "Serving site");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            root: PathBuf::from("site"),
        };
        assert_eq!(config.addr().unwrap().port(), 8000);

        let config = ServerConfig {
            host: "not a host".to_owned(),
            ..config
        };
        assert!(matches!(config.addr(), Err(ServerError::InvalidAddress(_))));
    }
}
