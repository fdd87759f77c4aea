use axum::http::Method;
use serde_json::{json, Value};

use crate::support::{read_json, send_request, setup_test_app, PASSWORD};

#[tokio::test]
async fn owner_manages_tweets() {
    let app = setup_test_app().await;
    let alice = app.seed_user("alice").await;
    let (access, _) = app.login("alice", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/tweets",
        Some(&access),
        Some(json!({ "content": "first post" })),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body: Value = read_json(response).await;
    let tweet_id = body["data"]["id"].as_str().expect("tweet id").to_string();
    assert_eq!(body["data"]["owner"], alice.id.as_str());

    let path = format!("/api/v1/tweets/{}", tweet_id);
    let response =
        send_request(&app, Method::PATCH, &path, Some(&access), Some(json!({ "content": "edited" })))
            .await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["content"], "edited");

    let list = format!("/api/v1/tweets/user/{}", alice.id);
    let response = send_request(&app, Method::GET, &list, Some(&access), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"].as_array().expect("array").len(), 1);

    let response = send_request(&app, Method::DELETE, &path, Some(&access), None).await;
    assert_eq!(response.status(), 200);

    let response = send_request(&app, Method::DELETE, &path, Some(&access), None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn other_users_are_forbidden() {
    let app = setup_test_app().await;
    let alice = app.seed_user("alice").await;
    app.seed_user("mallory").await;
    let (alice_access, _) = app.login("alice", PASSWORD).await;
    let (mallory_access, _) = app.login("mallory", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/tweets",
        Some(&alice_access),
        Some(json!({ "content": "mine" })),
    )
    .await;
    let body: Value = read_json(response).await;
    let path = format!("/api/v1/tweets/{}", body["data"]["id"].as_str().expect("tweet id"));

    let response = send_request(
        &app,
        Method::PATCH,
        &path,
        Some(&mallory_access),
        Some(json!({ "content": "hijacked" })),
    )
    .await;
    assert_eq!(response.status(), 403);

    let response = send_request(&app, Method::DELETE, &path, Some(&mallory_access), None).await;
    assert_eq!(response.status(), 403);

    let list = format!("/api/v1/tweets/user/{}", alice.id);
    let response = send_request(&app, Method::GET, &list, Some(&mallory_access), None).await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let app = setup_test_app().await;
    app.seed_user("alice").await;
    let (access, _) = app.login("alice", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/tweets",
        Some(&access),
        Some(json!({ "content": "  " })),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = read_json(response).await;
    assert_eq!(body["errors"], json!(["content"]));

    let response =
        send_request(&app, Method::GET, "/api/v1/tweets/user/not-a-uuid", Some(&access), None).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn uppercase_ids_address_the_same_resources() {
    let app = setup_test_app().await;
    let quin = app.seed_user("quin").await;
    let (access, _) = app.login("quin", PASSWORD).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/v1/tweets",
        Some(&access),
        Some(json!({ "content": "shouting ids" })),
    )
    .await;
    let body: Value = read_json(response).await;
    let tweet_id = body["data"]["id"].as_str().expect("tweet id").to_uppercase();

    let list = format!("/api/v1/tweets/user/{}", quin.id.as_str().to_uppercase());
    let response = send_request(&app, Method::GET, &list, Some(&access), None).await;
    assert_eq!(response.status(), 200);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"].as_array().expect("array").len(), 1);

    let path = format!("/api/v1/tweets/{}", tweet_id);
    let response =
        send_request(&app, Method::PATCH, &path, Some(&access), Some(json!({ "content": "quiet" })))
            .await;
    assert_eq!(response.status(), 200);

    let response = send_request(&app, Method::DELETE, &path, Some(&access), None).await;
    assert_eq!(response.status(), 200);
}
