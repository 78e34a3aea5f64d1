//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::live_reload::{self, CLIENT_SCRIPT, LiveReload, WS_PATH};
use crate::security;

/// Create the application router serving `root`.
///
/// Directory URLs resolve to their `index.html`. With `live_reload`, the
/// reload endpoint is mounted and HTML responses carry the reload client.
pub(crate) fn create_router(root: &Path, live_reload: Option<LiveReload>) -> Router {
    let files = ServeDir::new(root).append_index_html_on_directories(true);
    let mut router = Router::new().fallback_service(files);

    if let Some(live_reload) = live_reload {
        let reload = Router::new()
            .route(WS_PATH, get(live_reload::ws_handler))
            .with_state(live_reload);
        router = router
            .merge(reload)
            .layer(middleware::map_response(inject_reload_script));
    }

    security::with_security_headers(router).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    )
}

/// Insert the reload client before `</body>` of successful HTML responses.
async fn inject_reload_script(response: Response) -> Response {
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"));
    if !is_html || response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let html = String::from_utf8_lossy(&bytes);
    let injected = match html.rfind("</body>") {
        Some(pos) => format!("{}{CLIENT_SCRIPT}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{CLIENT_SCRIPT}"),
    };

    parts.headers.remove(CONTENT_LENGTH);
    if let Ok(length) = HeaderValue::from_str(&injected.len().to_string()) {
        parts.headers.insert(CONTENT_LENGTH, length);
    }
    Response::from_parts(parts, Body::from(injected))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><body><h1>Home</h1></body></html>",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("php/arrays")).unwrap();
        fs::write(
            dir.path().join("php/arrays/index.html"),
            "<html><body><h1>Arrays</h1></body></html>",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/main.css"), "body{}").unwrap();
        dir
    }

    async fn request(router: Router, uri: &str) -> (StatusCode, Response) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        (response.status(), response)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serves_root_index() {
        let dir = site();
        let (status, response) = request(create_router(dir.path(), None), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body_text(response).await.contains("<h1>Home</h1>"));
    }

    #[tokio::test]
    async fn test_serves_directory_url() {
        let dir = site();
        let (status, response) = request(create_router(dir.path(), None), "/php/arrays/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body_text(response).await.contains("<h1>Arrays</h1>"));
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let dir = site();
        let (status, _) = request(create_router(dir.path(), None), "/nope/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_security_headers() {
        let dir = site();
        let (_, response) = request(create_router(dir.path(), None), "/assets/main.css").await;
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "same-origin");
        assert!(
            headers["content-security-policy"]
                .to_str()
                .unwrap()
                .contains("connect-src 'self' ws: wss:")
        );
    }

    #[tokio::test]
    async fn test_no_script_without_live_reload() {
        let dir = site();
        let (_, response) = request(create_router(dir.path(), None), "/").await;
        assert!(!body_text(response).await.contains(WS_PATH));
    }

    #[tokio::test]
    async fn test_script_injected_before_body_end() {
        let dir = site();
        let router = create_router(dir.path(), Some(LiveReload::new()));
        let (status, response) = request(router, "/php/arrays/").await;
        assert_eq!(status, StatusCode::OK);
        let length: usize = response.headers()[CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = body_text(response).await;
        assert_eq!(length, body.len());
        let script = body.find(WS_PATH).unwrap();
        assert!(script < body.find("</body>").unwrap());
    }

    #[tokio::test]
    async fn test_assets_not_injected() {
        let dir = site();
        let router = create_router(dir.path(), Some(LiveReload::new()));
        let (_, response) = request(router, "/assets/main.css").await;
        assert_eq!(body_text(response).await, "body{}");
    }

    #[tokio::test]
    async fn test_inject_without_body_tag() {
        let response = Response::builder()
            .header(CONTENT_TYPE, "text/html")
            .body(Body::from("<p>fragment</p>"))
            .unwrap();
        let body = body_text(inject_reload_script(response).await).await;
        assert!(body.starts_with("<p>fragment</p><script>"));
    }
}
