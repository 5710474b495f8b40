//! HTTP tests for registration, login and the current-user endpoint.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use common::{CLIENT_ID, REDIRECT_URI, TestApp, json_body};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn register(app: &TestApp, email: &str, password: &str) -> axum::http::Response<Body> {
    app.send(post_json(
        "/api/auth/register",
        json!({ "email": email, "password": password, "name": "Ada" }),
    ))
    .await
}

async fn login(app: &TestApp, email: &str, password: &str) -> axum::http::Response<Body> {
    app.send(post_json("/api/auth/login", json!({ "email": email, "password": password })))
        .await
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new().await;

    let response = register(&app, "ada@example.com", "hunter22").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(body["data"].get("password_hash").is_none());

    let response = login(&app, "ada@example.com", "hunter22").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["name"], "Ada");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;

    assert_eq!(register(&app, "ada@example.com", "hunter22").await.status(), StatusCode::CREATED);

    let response = register(&app, "ada@example.com", "another1").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "email_exists");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;

    let response = register(&app, "not-an-email", "hunter22").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_email");

    let response = register(&app, "ada@example.com", "short").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "weak_password");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new().await;
    register(&app, "ada@example.com", "hunter22").await;

    let response = login(&app, "ada@example.com", "hunter23").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "invalid_credentials");

    let response = login(&app, "nobody@example.com", "hunter22").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = TestApp::new().await;

    let response = app.send(Request::get("/api/auth/me").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_session_drives_authorize() {
    let app = TestApp::new().await;
    register(&app, "ada@example.com", "hunter22").await;
    let body = json_body(login(&app, "ada@example.com", "hunter22").await).await;
    let session = body["data"]["token"].as_str().unwrap().to_string();

    let me = app
        .send(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["data"]["email"], "ada@example.com");

    let response = app
        .authorize(
            &[
                ("client_id", CLIENT_ID),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
            ],
            Some(&session),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_login_rejects_non_json_body() {
    let app = TestApp::new().await;

    let request = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=ada%40example.com&password=hunter22"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_register_missing_field() {
    let app = TestApp::new().await;

    let response = app.send(post_json("/api/auth/register", json!({ "email": "ada@example.com" }))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_request");
}
