use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use videotube::{
    api::{build_router, ApiState},
    auth::{hashing, NewUser, User},
    blob::{BlobStore, DeleteOutcome, UploadedAsset},
    config::DatabaseConfig,
    domain::UserId,
    storage::{create_pool, DbPool, SqlxUserRepository, UserRepository},
    Config,
};

pub const PASSWORD: &str = "correct horse battery staple";

/// Blob store double: uploads succeed unless the staged file name contains "fail".
#[derive(Default)]
pub struct RecordingStore {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn upload(&self, local_path: &Path) -> Option<UploadedAsset> {
        let name = local_path.file_name()?.to_str()?.to_string();
        let _ = tokio::fs::remove_file(local_path).await;
        if name.contains("fail") {
            return None;
        }
        self.uploaded.lock().expect("lock").push(name.clone());
        let duration = name.ends_with(".mp4").then_some(30.0);
        Some(UploadedAsset { url: format!("https://cdn.test/{}", name), public_id: name, duration })
    }

    async fn delete(&self, public_id: &str) -> Option<DeleteOutcome> {
        self.deleted.lock().expect("lock").push(public_id.to_string());
        Some(DeleteOutcome { result: "ok".into() })
    }
}

pub struct TestApp {
    pub state: ApiState,
    pub pool: DbPool,
    pub config: Config,
    pub blobs: Arc<RecordingStore>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn users(&self) -> SqlxUserRepository {
        SqlxUserRepository::new(self.pool.clone())
    }

    pub async fn seed_user(&self, username: &str) -> User {
        self.users()
            .create_user(NewUser {
                id: UserId::new(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                fullname: format!("{} Example", username),
                avatar: format!("https://cdn.test/{}.png", username),
                cover_image: None,
                password_hash: hashing::hash_password(PASSWORD).expect("hash"),
            })
            .await
            .expect("seed user")
    }

    pub async fn stored_refresh_token(&self, user: &User) -> Option<String> {
        self.users().get_credentials(&user.id).await.expect("query").expect("row").refresh_token
    }

    /// Log in over HTTP and return (access token, refresh token)
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let response = send_request(
            self,
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(response.status(), 200, "login for {} failed", username);
        let body: Value = read_json(response).await;
        (
            body["data"]["accessToken"].as_str().expect("access token").to_string(),
            body["data"]["refreshToken"].as_str().expect("refresh token").to_string(),
        )
    }
}

pub async fn setup_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("upload dir");

    let mut config = Config::default();
    config.blob_store.temp_dir = upload_dir.path().to_path_buf();
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        idle_timeout_seconds: 0,
        auto_migrate: true,
        ..Default::default()
    };

    let pool = create_pool(&config.database).await.expect("create sqlite pool");
    let blobs = Arc::new(RecordingStore::default());
    let state = ApiState::new(pool.clone(), &config, blobs.clone());

    TestApp { state, pool, config, blobs, upload_dir }
}

pub async fn send_request(
    app: &TestApp,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder, body).await
}

pub async fn send_with_cookie(
    app: &TestApp,
    method: Method,
    path: &str,
    cookie: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(path).header(header::COOKIE, cookie);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder, body).await
}

async fn send(app: &TestApp, builder: axum::http::request::Builder, body: Option<Value>) -> Response {
    let request = if let Some(json) = body {
        let bytes = serde_json::to_vec(&json).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("build request")
    } else {
        builder.body(Body::empty()).expect("build request")
    };

    app.router().oneshot(request).await.expect("request")
}

/// Part of a hand-built multipart body
pub enum FormPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub async fn send_multipart(
    app: &TestApp,
    method: Method,
    path: &str,
    token: Option<&str>,
    parts: &[FormPart<'_>],
) -> Response {
    const BOUNDARY: &str = "videotube-test-boundary";

    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                        .as_bytes(),
                );
            }
            FormPart::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    app.router()
        .oneshot(builder.body(Body::from(body)).expect("build request"))
        .await
        .expect("request")
}

/// Publish a video over HTTP and return the `data` of the response
pub async fn publish_video(app: &TestApp, token: &str, title: &str) -> Value {
    let response = send_multipart(
        app,
        Method::POST,
        "/api/v1/videos",
        Some(token),
        &[
            FormPart::Text("title", title),
            FormPart::Text("description", "uploaded in a test"),
            FormPart::File("videoFile", "clip.mp4", b"video-bytes"),
            FormPart::File("thumbnail", "thumb.png", b"image-bytes"),
        ],
    )
    .await;
    assert_eq!(response.status(), 201, "publishing {} failed", title);
    let body: Value = read_json(response).await;
    body["data"].clone()
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect()
}

/// Value of a named cookie from `Set-Cookie` headers
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|raw| {
        let pair = raw.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}
