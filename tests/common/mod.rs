#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use wardrobe_api::media::MediaStore;
use wardrobe_api::store::{EntityStore, MemoryStore};
use wardrobe_api::{app, AppState};

/// 1x1 RGBA PNG
pub const TEST_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8,
    0xcf, 0xc0, 0xf0, 0x1f, 0x00, 0x05, 0x00, 0x01, 0xff, 0x89, 0x99, 0x3d, 0x1d, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Builds an app over a fresh in-memory store with an isolated media root.
/// Returns the router plus the media root so tests can assert on stored files.
pub fn test_app() -> (Router, PathBuf) {
    let media_root = std::env::temp_dir().join(format!("wardrobe-test-{}", Uuid::new_v4()));
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    let state = AppState {
        store,
        media: MediaStore::new(media_root.clone()),
    };
    (app(state), media_root)
}

/// Fires one request at the in-process router and decodes the JSON body
/// (Null for empty bodies, e.g. 204s)
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not JSON")
    };
    (status, value)
}

/// Registers an account and returns a bearer token for it
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "name": "Test User", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["token"]
        .as_str()
        .expect("login response missing token")
        .to_string()
}

/// Posts bytes as the `image` field of a multipart form
pub async fn upload_image(
    app: &Router,
    uri: &str,
    token: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let boundary = "wardrobe-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"upload.png\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not JSON")
    };
    (status, value)
}

/// Creates a collection and returns its id
pub async fn create_collection(app: &Router, token: &str, payload: Value) -> i64 {
    let (status, body) = request(app, "POST", "/api/collections", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["data"]["id"].as_i64().expect("collection id")
}

/// Looks up an attr id by name in a `/api/tags` or `/api/garments` listing
pub async fn attr_id_by_name(app: &Router, token: &str, uri: &str, name: &str) -> i64 {
    let (status, body) = request(app, "GET", uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "listing failed: {}", body);
    body["data"]
        .as_array()
        .expect("listing is an array")
        .iter()
        .find(|item| item["name"] == name)
        .unwrap_or_else(|| panic!("no attr named {} in {}", name, body))["id"]
        .as_i64()
        .expect("attr id")
}
