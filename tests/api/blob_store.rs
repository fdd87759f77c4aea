//! `CloudinaryStore` against a mock upload API.

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use videotube::blob::{BlobStore, CloudinaryStore};
use videotube::config::BlobStoreConfig;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> CloudinaryStore {
    CloudinaryStore::new(BlobStoreConfig {
        cloud_name: "demo".into(),
        api_key: "test-key".into(),
        api_secret: "test-secret".into(),
        base_url: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .expect("blob store client")
}

async fn staged_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("avatar.png");
    tokio::fs::write(&path, b"image-bytes").await.expect("write staged file");
    path
}

#[tokio::test]
async fn upload_returns_secure_url_and_removes_local_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/auto/upload"))
        .and(body_string_contains("test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "avatars/abc",
            "url": "http://cdn.test/avatars/abc.png",
            "secure_url": "https://cdn.test/avatars/abc.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = staged_file(&dir).await;

    let asset = store_for(&server).upload(&file).await.expect("uploaded");
    assert_eq!(asset.url, "https://cdn.test/avatars/abc.png");
    assert_eq!(asset.public_id, "avatars/abc");
    assert_eq!(asset.duration, None);
    assert!(!file.exists());
}

#[tokio::test]
async fn video_upload_carries_duration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/auto/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "videos/clip",
            "secure_url": "https://cdn.test/videos/clip.mp4",
            "resource_type": "video",
            "duration": 12.5
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = staged_file(&dir).await;

    let asset = store_for(&server).upload(&file).await.expect("uploaded");
    assert_eq!(asset.duration, Some(12.5));
}

#[tokio::test]
async fn rejected_upload_is_none_and_removes_local_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/auto/upload"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = staged_file(&dir).await;

    assert!(store_for(&server).upload(&file).await.is_none());
    assert!(!file.exists());
}

#[tokio::test]
async fn missing_local_file_is_none() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    assert!(store_for(&server).upload(&dir.path().join("missing.png")).await.is_none());
}

#[tokio::test]
async fn delete_reports_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/destroy"))
        .and(body_string_contains("public_id=avatars%2Fabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store_for(&server).delete("avatars/abc").await.expect("deleted");
    assert_eq!(outcome.result, "ok");
}

#[tokio::test]
async fn failed_delete_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/destroy"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(store_for(&server).delete("avatars/abc").await.is_none());
}

#[tokio::test]
async fn video_delete_targets_video_resource() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/video/destroy"))
        .and(body_string_contains("public_id=videos%2Fclip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store_for(&server).delete_video("videos/clip").await.expect("deleted");
    assert_eq!(outcome.result, "ok");
}
