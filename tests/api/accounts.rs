//! Registration and profile endpoints, with the recording blob store standing in for the media host.

use axum::http::Method;
use serde_json::{json, Value};

use crate::support::{
    read_json, send_multipart, send_request, setup_test_app, FormPart, TestApp, PASSWORD,
};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

fn staged_files(app: &TestApp) -> usize {
    std::fs::read_dir(app.upload_dir.path()).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn register_uploads_media_and_creates_account() {
    let app = setup_test_app().await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        &[
            FormPart::Text("fullname", "Alice Liddell"),
            FormPart::Text("email", "Alice@Example.com"),
            FormPart::Text("username", "Alice"),
            FormPart::Text("password", PASSWORD),
            FormPart::File("avatar", "avatar.png", PNG),
            FormPart::File("coverImage", "cover.png", PNG),
        ],
    )
    .await;
    assert_eq!(response.status(), 201);

    let body: Value = read_json(response).await;
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"]["avatar"].as_str().expect("avatar").starts_with("https://cdn.test/"));
    assert!(body["data"]["coverImage"].as_str().expect("cover").ends_with("cover.png"));
    assert!(body["data"].get("password").is_none());

    assert_eq!(app.blobs.uploaded.lock().expect("lock").len(), 2);
    assert_eq!(staged_files(&app), 0);

    app.login("alice", PASSWORD).await;
}

#[tokio::test]
async fn register_requires_avatar() {
    let app = setup_test_app().await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        &[
            FormPart::Text("fullname", "No Avatar"),
            FormPart::Text("email", "noavatar@example.com"),
            FormPart::Text("username", "noavatar"),
            FormPart::Text("password", PASSWORD),
            FormPart::File("coverImage", "cover.png", PNG),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = read_json(response).await;
    assert_eq!(body["errors"], json!(["avatar"]));
    assert_eq!(staged_files(&app), 0);
}

#[tokio::test]
async fn register_rejects_blank_fields() {
    let app = setup_test_app().await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        &[
            FormPart::Text("fullname", "   "),
            FormPart::Text("email", "blank@example.com"),
            FormPart::Text("username", "blank"),
            FormPart::Text("password", PASSWORD),
            FormPart::File("avatar", "avatar.png", PNG),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    assert!(app.blobs.uploaded.lock().expect("lock").is_empty());
    assert_eq!(staged_files(&app), 0);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = setup_test_app().await;
    app.seed_user("bob").await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        &[
            FormPart::Text("fullname", "Another Bob"),
            FormPart::Text("email", "other-bob@example.com"),
            FormPart::Text("username", "BOB"),
            FormPart::Text("password", PASSWORD),
            FormPart::File("avatar", "avatar.png", PNG),
        ],
    )
    .await;
    assert_eq!(response.status(), 409);
    assert!(app.blobs.uploaded.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn failed_cover_upload_rolls_back_avatar() {
    let app = setup_test_app().await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        &[
            FormPart::Text("fullname", "Carol Danvers"),
            FormPart::Text("email", "carol@example.com"),
            FormPart::Text("username", "carol"),
            FormPart::Text("password", PASSWORD),
            FormPart::File("avatar", "avatar.png", PNG),
            FormPart::File("coverImage", "fail-cover.png", PNG),
        ],
    )
    .await;
    assert_eq!(response.status(), 502);

    let uploaded = app.blobs.uploaded.lock().expect("lock").clone();
    let deleted = app.blobs.deleted.lock().expect("lock").clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(deleted, uploaded);
    assert_eq!(staged_files(&app), 0);

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "carol", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn update_account_and_avatar() {
    let app = setup_test_app().await;
    app.seed_user("dave").await;
    let (access, _) = app.login("dave", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/update-account",
        Some(&access),
        Some(json!({ "fullname": "David Bowman", "email": "Dave@Discovery.one" })),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["fullname"], "David Bowman");
    assert_eq!(body["data"]["email"], "dave@discovery.one");

    let response = send_multipart(
        &app,
        Method::PATCH,
        "/api/v1/users/avatar",
        Some(&access),
        &[FormPart::File("avatar", "new-avatar.png", PNG)],
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert!(body["data"]["avatar"].as_str().expect("avatar").ends_with("new-avatar.png"));

    let response = send_multipart(
        &app,
        Method::PATCH,
        "/api/v1/users/cover-image",
        Some(&access),
        &[FormPart::Text("caption", "no file attached")],
    )
    .await;
    assert_eq!(response.status(), 400);
}
