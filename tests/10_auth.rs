mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_normalizes_email_domain() {
    let (app, _) = common::test_app();

    let (status, body) = common::request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "NewUser@EXAMPLE.COM", "name": "New", "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["email"], "NewUser@example.com");
    // Credential material never leaves the server
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_rejects_empty_email() {
    let (app, _) = common::test_app();

    let (status, body) = common::request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "  ", "name": "New", "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (app, _) = common::test_app();
    common::register_and_login(&app, "dup@example.com").await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "dup@example.com", "name": "Again", "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (app, _) = common::test_app();
    common::register_and_login(&app, "user@example.com").await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_accepts_unnormalized_email() {
    let (app, _) = common::test_app();
    common::register_and_login(&app, "case@example.com").await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "case@EXAMPLE.com", "password": "secret-pass" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["expires_in"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let (app, _) = common::test_app();

    for uri in ["/api/collections", "/api/tags", "/api/garments", "/api/auth/whoami"] {
        let (status, body) = common::request(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}: {}", uri, body);
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let (app, _) = common::test_app();

    let (status, _) =
        common::request(&app, "GET", "/api/collections", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_returns_current_user() {
    let (app, _) = common::test_app();
    let token = common::register_and_login(&app, "me@example.com").await;

    let (status, body) = common::request(&app, "GET", "/api/auth/whoami", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["email"], "me@example.com");
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = common::test_app();

    let (status, body) = common::request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
