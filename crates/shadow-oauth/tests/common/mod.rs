//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::Duration;
use tower::ServiceExt;

use shadow_oauth::{Config, ManualClock, MemoryStore, OAuthServer, models::Client};

pub const CLIENT_ID: &str = "abc";
pub const CLIENT_SECRET: &str = "s3cret";
pub const REDIRECT_URI: &str = "https://app.example/cb";

pub struct TestApp {
    pub server: OAuthServer,
    pub router: Router,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Server with client `abc` registered and a manual clock.
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::starting_now());
        let server =
            OAuthServer::with_clock(&Config::for_testing(), Arc::new(store.clone()), clock.clone());

        server
            .state()
            .oauth
            .registry()
            .register(Client::new(CLIENT_ID, CLIENT_SECRET, "Example App", REDIRECT_URI))
            .await
            .unwrap();

        let router = server.router();
        Self { server, router, store, clock }
    }

    /// A login session token for `user_id`, signed by this server.
    pub fn session_for(&self, user_id: u64) -> String {
        let (token, _) =
            self.server.state().oauth.codec().issue_session(user_id, Duration::hours(1)).unwrap();
        token
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn authorize(&self, params: &[(&str, &str)], session: Option<&str>) -> Response<Body> {
        let query = serde_urlencoded::to_string(params).unwrap();
        let mut request = Request::get(format!("/oauth/authorize?{query}"));
        if let Some(session) = session {
            request = request.header(header::AUTHORIZATION, format!("Bearer {session}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn token(&self, params: &[(&str, &str)]) -> Response<Body> {
        let body = serde_urlencoded::to_string(params).unwrap();
        let request = Request::post("/oauth/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Run the authorize step for `user_id` and return the issued code.
    pub async fn issue_code(&self, user_id: u64) -> String {
        let session = self.session_for(user_id);
        let response = self
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
        query_param(&location(&response), "code").unwrap()
    }

    pub async fn exchange(&self, code: &str) -> Response<Body> {
        self.token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("client_id", CLIENT_ID),
            ("client_secret", CLIENT_SECRET),
        ])
        .await
    }
}

pub fn location(response: &Response<Body>) -> String {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string()
}

pub fn query_param(location: &str, name: &str) -> Option<String> {
    url::Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
