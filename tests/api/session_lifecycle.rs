//! Session lifecycle over HTTP: login, refresh rotation, logout, password change.

use axum::http::Method;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::support::{
    cookie_value, read_json, send_request, send_with_cookie, set_cookies, setup_test_app, PASSWORD,
};

#[tokio::test]
async fn alice_full_session_flow() {
    let app = setup_test_app().await;
    let alice = app.seed_user("alice").await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), 200);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"), "cookie not http-only: {}", cookie);
        assert!(cookie.contains("SameSite=Strict"), "cookie not strict: {}", cookie);
    }
    let access_cookie = cookie_value(&response, "accessToken").expect("access cookie");
    let refresh_cookie = cookie_value(&response, "refreshToken").expect("refresh cookie");

    let body: Value = read_json(response).await;
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["user"].get("refreshToken").is_none());
    let a1 = body["data"]["accessToken"].as_str().expect("access").to_string();
    let r1 = body["data"]["refreshToken"].as_str().expect("refresh").to_string();
    assert_eq!(access_cookie, a1);
    assert_eq!(refresh_cookie, r1);
    assert_eq!(app.stored_refresh_token(&alice).await.as_deref(), Some(r1.as_str()));

    let response = send_request(&app, Method::GET, "/api/v1/users/current-user", Some(&a1), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["id"], alice.id.as_str());

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": r1 })),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    let a2 = body["data"]["accessToken"].as_str().expect("access").to_string();
    let r2 = body["data"]["refreshToken"].as_str().expect("refresh").to_string();
    assert_ne!(r1, r2);
    assert_ne!(a1, a2);
    assert_eq!(app.stored_refresh_token(&alice).await.as_deref(), Some(r2.as_str()));

    // The consumed refresh token is single-use
    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": r1 })),
    )
    .await;
    assert_eq!(response.status(), 401);
    assert_eq!(app.stored_refresh_token(&alice).await.as_deref(), Some(r2.as_str()));

    let response = send_request(&app, Method::GET, "/api/v1/users/current-user", Some(&a2), None).await;
    assert_eq!(response.status(), 200);

    let response = send_request(&app, Method::POST, "/api/v1/users/logout", Some(&a2), None).await;
    assert_eq!(response.status(), 200);
    let removed = set_cookies(&response);
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|cookie| cookie.contains("Max-Age=0")));
    assert_eq!(app.stored_refresh_token(&alice).await, None);

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": r2 })),
    )
    .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn refresh_accepts_cookie() {
    let app = setup_test_app().await;
    app.seed_user("carol").await;
    let (_, refresh) = app.login("carol", PASSWORD).await;

    let response = send_with_cookie(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        &format!("refreshToken={}", refresh),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    let rotated = cookie_value(&response, "refreshToken").expect("rotated cookie");
    assert_ne!(rotated, refresh);
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::POST, "/api/v1/users/refresh-token", None, None).await;
    assert_eq!(response.status(), 401);
    let body: Value = read_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn wrong_password_leaves_session_untouched() {
    let app = setup_test_app().await;
    let bob = app.seed_user("bob").await;
    let (_, refresh) = app.login("bob", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "email": "bob@example.com", "password": "not the password" })),
    )
    .await;
    assert_eq!(response.status(), 401);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(app.stored_refresh_token(&bob).await.as_deref(), Some(refresh.as_str()));
}

#[tokio::test]
async fn login_for_unknown_user_is_not_found() {
    let app = setup_test_app().await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "ghost", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), 404);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "User does not exist");
}

#[tokio::test]
async fn second_login_revokes_first_refresh_token() {
    let app = setup_test_app().await;
    app.seed_user("dave").await;
    let (_, first) = app.login("dave", PASSWORD).await;
    let (_, second) = app.login("dave", PASSWORD).await;
    assert_ne!(first, second);

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn concurrent_refresh_has_one_winner() {
    let app = setup_test_app().await;
    let erin = app.seed_user("erin").await;
    let (_, refresh) = app.login("erin", PASSWORD).await;

    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let sessions = app.state.sessions.clone();
        let presented = refresh.clone();
        tasks.spawn(async move { sessions.refresh(Some(&presented)).await });
    }

    let mut winners = Vec::new();
    let mut losers = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.expect("task") {
            Ok(pair) => winners.push(pair),
            Err(_) => losers += 1,
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, 3);
    assert_eq!(
        app.stored_refresh_token(&erin).await.as_deref(),
        Some(winners[0].refresh_token.as_str())
    );
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = setup_test_app().await;
    app.seed_user("frank").await;
    let (access, refresh) = app.login("frank", PASSWORD).await;

    let response =
        send_request(&app, Method::GET, "/api/v1/users/current-user", Some(&refresh), None).await;
    assert_eq!(response.status(), 401);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Invalid or expired token");

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn expired_access_token_is_rejected() {
    let app = setup_test_app().await;
    let grace = app.seed_user("grace").await;

    let issued = chrono::Utc::now().timestamp() - 3_600;
    let claims = json!({
        "sub": grace.id.as_str(),
        "email": grace.email,
        "username": grace.username,
        "fullname": grace.fullname,
        "iat": issued,
        "exp": issued + 60,
        "jti": uuid::Uuid::new_v4().to_string(),
    });
    let stale = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.config.auth.access_token_secret.as_bytes()),
    )
    .expect("encode");

    let response = send_request(&app, Method::GET, "/api/v1/users/current-user", Some(&stale), None).await;
    assert_eq!(response.status(), 401);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn change_password_switches_credentials() {
    let app = setup_test_app().await;
    let heidi = app.seed_user("heidi").await;
    let (access, refresh) = app.login("heidi", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/change-password",
        Some(&access),
        Some(json!({ "oldPassword": "wrong", "newPassword": "next-password" })),
    )
    .await;
    assert_eq!(response.status(), 401);

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/change-password",
        Some(&access),
        Some(json!({ "oldPassword": PASSWORD, "newPassword": "next-password" })),
    )
    .await;
    assert_eq!(response.status(), 200);

    // Existing sessions survive a password change
    assert_eq!(app.stored_refresh_token(&heidi).await.as_deref(), Some(refresh.as_str()));

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "heidi", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), 401);

    app.login("heidi", "next-password").await;
}
