//! Routes outside the relay and invitation API: the API root and the
//! optional built-client directory.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use doc_relay::config::Config;
use doc_relay::routes::create_router;
use doc_relay::AppState;
use std::fs;
use tower::ServiceExt;

async fn get(config: &Config, uri: &str) -> (StatusCode, String) {
    let response = create_router(AppState::new(), config)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn api_root_says_it_is_running() {
    let (status, body) = get(&Config::default(), "/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "API is running...");
}

#[tokio::test]
async fn unknown_paths_are_not_found_without_a_client_build() {
    let (status, _) = get(&Config::default(), "/document/doc1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_build_is_served_with_index_fallback() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html>editor</html>").unwrap();
    fs::write(dir.path().join("app.js"), "console.log('editor')").unwrap();
    let config = Config {
        static_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..Config::default()
    };

    let (status, body) = get(&config, "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('editor')");

    // Client-side routes resolve to the single-page entry point.
    let (status, body) = get(&config, "/document/doc1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<html>editor</html>");

    // API routes still win over the client build.
    let (status, body) = get(&config, "/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "API is running...");
}
