//! Live reload over WebSocket.
//!
//! Every served HTML page gets a small client script that connects to
//! [`WS_PATH`] and reloads the page when a [`ReloadEvent`] arrives.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Serialize;
use tokio::sync::broadcast;

/// WebSocket endpoint of the reload client.
pub(crate) const WS_PATH: &str = "/__livereload";

/// Client script appended to HTML responses. Reconnects after the server
/// restarts.
pub(crate) const CLIENT_SCRIPT: &str = r#"<script>(() => {
  const scheme = location.protocol === "https:" ? "wss:" : "ws:";
  const connect = () => {
    const socket = new WebSocket(`${scheme}//${location.host}/__livereload`);
    socket.onmessage = () => location.reload();
    socket.onclose = () => setTimeout(connect, 1000);
  };
  connect();
})();</script>
"#;

const CHANNEL_CAPACITY: usize = 16;

/// Event sent to connected clients after a rebuild.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReloadEvent {
    /// Event type (always "reload").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Page or file that triggered the rebuild; empty for full rebuilds.
    pub path: String,
}

/// Broadcast handle for reload events.
///
/// Clones share the same channel, so the watcher thread can hold one while
/// the server holds another.
#[derive(Clone, Debug)]
pub struct LiveReload {
    sender: broadcast::Sender<ReloadEvent>,
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Tell connected pages to reload. Returns the number of clients reached.
    pub fn notify(&self, path: impl Into<String>) -> usize {
        let event = ReloadEvent {
            event_type: "reload".to_owned(),
            path: path.into(),
        };
        let clients = self.sender.send(event).unwrap_or(0);
        tracing::debug!(clients, "Sent reload event");
        clients
    }

    /// Subscribe to reload events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.sender.subscribe()
    }
}

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(live_reload): State<LiveReload>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, live_reload.subscribe()))
}

async fn handle_socket(mut socket: WebSocket, mut receiver: broadcast::Receiver<ReloadEvent>) {
    loop {
        tokio::select! {
            result = receiver.recv() => {
                match result {
                    Ok(event) => {
                        let Ok(msg) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if socket.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                }
            }
            // Client messages are keepalives
            result = socket.recv() => {
                if !matches!(result, Some(Ok(_))) {
                    break;
                }
            }
        }
    }
}
