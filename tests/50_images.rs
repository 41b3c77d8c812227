mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn collection_image_upload_stores_file_and_path() {
    let (app, media_root) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;
    let id = common::create_collection(&app, &token, json!({ "title": "Summer" })).await;

    let (status, body) = common::upload_image(
        &app,
        &format!("/api/collections/{}/upload-image", id),
        &token,
        common::TEST_PNG,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let path = body["data"]["image"].as_str().expect("image path");
    assert!(path.starts_with("uploads/collection/"), "{}", path);
    assert!(path.ends_with(".png"), "{}", path);
    assert!(media_root.join(path).is_file());

    // The stored path shows up on the detail view too
    let (_, detail) = common::request(
        &app,
        "GET",
        &format!("/api/collections/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["data"]["image"], path);
}

#[tokio::test]
async fn garment_image_upload_uses_its_own_subdirectory() {
    let (app, media_root) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;

    common::create_collection(
        &app,
        &token,
        json!({ "title": "Summer", "garments": [{ "name": "Sandals" }] }),
    )
    .await;
    let garment = common::attr_id_by_name(&app, &token, "/api/garments", "Sandals").await;

    let (status, body) = common::upload_image(
        &app,
        &format!("/api/garments/{}/upload-image", garment),
        &token,
        common::TEST_PNG,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let path = body["data"]["image"].as_str().expect("image path");
    assert!(path.starts_with("uploads/garment/"), "{}", path);
    assert!(media_root.join(path).is_file());
}

#[tokio::test]
async fn non_image_payload_is_rejected() {
    let (app, _) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;
    let id = common::create_collection(&app, &token, json!({ "title": "Summer" })).await;

    let (status, body) = common::upload_image(
        &app,
        &format!("/api/collections/{}/upload-image", id),
        &token,
        b"definitely not an image",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn truncated_image_payload_is_rejected() {
    let (app, _) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;
    let id = common::create_collection(&app, &token, json!({ "title": "Summer" })).await;

    let (status, body) = common::upload_image(
        &app,
        &format!("/api/collections/{}/upload-image", id),
        &token,
        &common::TEST_PNG[..common::TEST_PNG.len() / 2],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn reupload_replaces_the_previous_file() {
    let (app, media_root) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;
    let id = common::create_collection(&app, &token, json!({ "title": "Summer" })).await;
    let uri = format!("/api/collections/{}/upload-image", id);

    let (_, first) = common::upload_image(&app, &uri, &token, common::TEST_PNG).await;
    let first_path = first["data"]["image"].as_str().unwrap().to_string();

    let (status, second) = common::upload_image(&app, &uri, &token, common::TEST_PNG).await;
    assert_eq!(status, StatusCode::OK);
    let second_path = second["data"]["image"].as_str().unwrap();

    assert_ne!(first_path, second_path);
    assert!(!media_root.join(&first_path).exists());
    assert!(media_root.join(second_path).is_file());
}

#[tokio::test]
async fn deleting_a_collection_removes_its_image_file() {
    let (app, media_root) = common::test_app();
    let token = common::register_and_login(&app, "a@example.com").await;
    let id = common::create_collection(&app, &token, json!({ "title": "Summer" })).await;

    let (_, body) = common::upload_image(
        &app,
        &format!("/api/collections/{}/upload-image", id),
        &token,
        common::TEST_PNG,
    )
    .await;
    let path = body["data"]["image"].as_str().unwrap().to_string();
    assert!(media_root.join(&path).is_file());

    let (status, _) = common::request(
        &app,
        "DELETE",
        &format!("/api/collections/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!media_root.join(&path).exists());
}

#[tokio::test]
async fn upload_to_foreign_collection_reads_as_missing() {
    let (app, _) = common::test_app();
    let owner_token = common::register_and_login(&app, "owner@example.com").await;
    let other_token = common::register_and_login(&app, "other@example.com").await;
    let id = common::create_collection(&app, &owner_token, json!({ "title": "Mine" })).await;

    let (status, _) = common::upload_image(
        &app,
        &format!("/api/collections/{}/upload-image", id),
        &other_token,
        common::TEST_PNG,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
