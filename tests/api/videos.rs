use axum::http::Method;
use serde_json::{json, Value};

use crate::support::{
    publish_video, read_json, send_multipart, send_request, setup_test_app, FormPart, TestApp,
    PASSWORD,
};

fn staged_files(app: &TestApp) -> usize {
    std::fs::read_dir(app.upload_dir.path()).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn publish_uploads_video_and_thumbnail() {
    let app = setup_test_app().await;
    let maker = app.seed_user("maker").await;
    let (access, _) = app.login("maker", PASSWORD).await;

    let video = publish_video(&app, &access, "Intro").await;
    assert_eq!(video["title"], "Intro");
    assert_eq!(video["owner"], maker.id.as_str());
    assert_eq!(video["isPublished"], true);
    assert_eq!(video["views"], 0);
    assert_eq!(video["duration"], 30.0);
    assert!(video["videoFile"].as_str().expect("url").ends_with("clip.mp4"));
    assert!(video["thumbnail"].as_str().expect("url").ends_with("thumb.png"));
    assert!(video.get("videoPublicId").is_none());

    assert_eq!(app.blobs.uploaded.lock().expect("lock").len(), 2);
    assert_eq!(staged_files(&app), 0);
}

#[tokio::test]
async fn failed_thumbnail_upload_removes_uploaded_video() {
    let app = setup_test_app().await;
    app.seed_user("maker").await;
    let (access, _) = app.login("maker", PASSWORD).await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/videos",
        Some(&access),
        &[
            FormPart::Text("title", "Broken"),
            FormPart::Text("description", "thumbnail host is down"),
            FormPart::File("videoFile", "clip.mp4", b"video-bytes"),
            FormPart::File("thumbnail", "thumb-fail.png", b"image-bytes"),
        ],
    )
    .await;
    assert_eq!(response.status(), 502);

    let uploaded = app.blobs.uploaded.lock().expect("lock").clone();
    let deleted = app.blobs.deleted.lock().expect("lock").clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(deleted, uploaded);
    assert_eq!(staged_files(&app), 0);

    let response = send_request(&app, Method::GET, "/api/v1/dashboard/videos", Some(&access), None).await;
    let body: Value = read_json(response).await;
    assert!(body["data"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn publish_requires_both_files() {
    let app = setup_test_app().await;
    app.seed_user("maker").await;
    let (access, _) = app.login("maker", PASSWORD).await;

    let response = send_multipart(
        &app,
        Method::POST,
        "/api/v1/videos",
        Some(&access),
        &[
            FormPart::Text("title", "No thumbnail"),
            FormPart::Text("description", "missing a file"),
            FormPart::File("videoFile", "clip.mp4", b"video-bytes"),
        ],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"], json!(["thumbnail"]));
    assert!(app.blobs.uploaded.lock().expect("lock").is_empty());
    assert_eq!(staged_files(&app), 0);
}

#[tokio::test]
async fn viewing_counts_and_lands_in_history() {
    let app = setup_test_app().await;
    app.seed_user("maker").await;
    app.seed_user("viewer").await;
    let (maker, _) = app.login("maker", PASSWORD).await;
    let (viewer, _) = app.login("viewer", PASSWORD).await;

    let video = publish_video(&app, &maker, "Intro").await;
    let path = format!("/api/v1/videos/{}", video["id"].as_str().expect("id"));

    send_request(&app, Method::GET, &path, Some(&viewer), None).await;
    let response = send_request(&app, Method::GET, &path, Some(&viewer), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["views"], 2);

    let response = send_request(&app, Method::GET, "/api/v1/users/history", Some(&viewer), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    let history = body["data"].as_array().expect("array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], video["id"]);

    let response = send_request(&app, Method::GET, "/api/v1/users/history", Some(&maker), None).await;
    let body: Value = read_json(response).await;
    assert!(body["data"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn unpublished_videos_are_hidden_from_other_viewers() {
    let app = setup_test_app().await;
    let maker_user = app.seed_user("maker").await;
    app.seed_user("viewer").await;
    let (maker, _) = app.login("maker", PASSWORD).await;
    let (viewer, _) = app.login("viewer", PASSWORD).await;

    let video = publish_video(&app, &maker, "Draft").await;
    let id = video["id"].as_str().expect("id");

    let toggle = format!("/api/v1/videos/toggle/publish/{}", id);
    let response = send_request(&app, Method::PATCH, &toggle, Some(&maker), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Video is now unpublished");
    assert_eq!(body["data"]["isPublished"], false);

    let path = format!("/api/v1/videos/{}", id);
    let response = send_request(&app, Method::GET, &path, Some(&viewer), None).await;
    assert_eq!(response.status(), 404);
    let response = send_request(&app, Method::GET, &path, Some(&maker), None).await;
    assert_eq!(response.status(), 200);

    let listing = format!("/api/v1/videos?userId={}", maker_user.id);
    let response = send_request(&app, Method::GET, &listing, Some(&viewer), None).await;
    let body: Value = read_json(response).await;
    assert!(body["data"].as_array().expect("array").is_empty());

    let response = send_request(&app, Method::GET, "/api/v1/dashboard/videos", Some(&maker), None).await;
    let body: Value = read_json(response).await;
    assert_eq!(body["data"].as_array().expect("array").len(), 1);

    let response = send_request(&app, Method::PATCH, &toggle, Some(&maker), None).await;
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Video is now published");
}

#[tokio::test]
async fn list_filters_by_channel_and_rejects_bad_ids() {
    let app = setup_test_app().await;
    let maker = app.seed_user("maker").await;
    app.seed_user("other").await;
    let (maker_access, _) = app.login("maker", PASSWORD).await;
    let (other_access, _) = app.login("other", PASSWORD).await;

    publish_video(&app, &maker_access, "Mine").await;
    publish_video(&app, &other_access, "Theirs").await;

    let response = send_request(&app, Method::GET, "/api/v1/videos", Some(&maker_access), None).await;
    let body: Value = read_json(response).await;
    assert_eq!(body["data"].as_array().expect("array").len(), 2);

    let listing = format!("/api/v1/videos?userId={}", maker.id);
    let response = send_request(&app, Method::GET, &listing, Some(&other_access), None).await;
    let body: Value = read_json(response).await;
    let titles: Vec<&str> =
        body["data"].as_array().expect("array").iter().filter_map(|v| v["title"].as_str()).collect();
    assert_eq!(titles, vec!["Mine"]);

    let response =
        send_request(&app, Method::GET, "/api/v1/videos?userId=nope", Some(&maker_access), None).await;
    assert_eq!(response.status(), 400);
    let response =
        send_request(&app, Method::GET, "/api/v1/videos/not-a-uuid", Some(&maker_access), None).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn owner_updates_details_and_thumbnail() {
    let app = setup_test_app().await;
    app.seed_user("maker").await;
    let (access, _) = app.login("maker", PASSWORD).await;
    let video = publish_video(&app, &access, "Intro").await;
    let path = format!("/api/v1/videos/{}", video["id"].as_str().expect("id"));

    let response = send_request(
        &app,
        Method::PATCH,
        &path,
        Some(&access),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["description"], "uploaded in a test");

    let response = send_multipart(
        &app,
        Method::PATCH,
        &path,
        Some(&access),
        &[FormPart::File("thumbnail", "better.png", b"image-bytes")],
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert!(body["data"]["thumbnail"].as_str().expect("url").ends_with("better.png"));
    assert_eq!(body["data"]["title"], "Renamed");

    let deleted = app.blobs.deleted.lock().expect("lock").clone();
    assert_eq!(deleted.len(), 1);
    assert!(deleted[0].ends_with("thumb.png"));

    let response = send_request(&app, Method::PATCH, &path, Some(&access), Some(json!({}))).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn only_the_owner_changes_or_deletes_a_video() {
    let app = setup_test_app().await;
    app.seed_user("maker").await;
    app.seed_user("mallory").await;
    let (maker, _) = app.login("maker", PASSWORD).await;
    let (mallory, _) = app.login("mallory", PASSWORD).await;
    let video = publish_video(&app, &maker, "Intro").await;
    let id = video["id"].as_str().expect("id");
    let path = format!("/api/v1/videos/{}", id);

    let response =
        send_request(&app, Method::PATCH, &path, Some(&mallory), Some(json!({ "title": "pwned" }))).await;
    assert_eq!(response.status(), 403);
    let response = send_request(&app, Method::DELETE, &path, Some(&mallory), None).await;
    assert_eq!(response.status(), 403);
    let toggle = format!("/api/v1/videos/toggle/publish/{}", id);
    let response = send_request(&app, Method::PATCH, &toggle, Some(&mallory), None).await;
    assert_eq!(response.status(), 403);
    assert!(app.blobs.deleted.lock().expect("lock").is_empty());

    let response = send_request(&app, Method::DELETE, &path, Some(&maker), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"], json!({}));
    assert_eq!(app.blobs.deleted.lock().expect("lock").len(), 2);

    let response = send_request(&app, Method::GET, &path, Some(&maker), None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn video_routes_require_authentication() {
    let app = setup_test_app().await;
    let response = send_request(&app, Method::GET, "/api/v1/videos", None, None).await;
    assert_eq!(response.status(), 401);
}
