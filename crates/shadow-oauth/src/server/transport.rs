//! HTTP transport: shared state, router, middleware.

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{auth, handlers};
use crate::identity::IdentityProvider;
use crate::models::ApiResponse;
use crate::oauth::OAuthService;

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub oauth: OAuthService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState").finish()
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<HttpState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // OAuth 2.0 authorization code grant
        .route("/oauth/authorize", get(handlers::handle_authorize))
        .route("/oauth/token", post(handlers::handle_token))
        .route("/oauth/userinfo", get(handlers::handle_userinfo))
        // Identity provider
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the browser front end: one origin, credentials allowed.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success(
        "service is running",
        serde_json::json!({
            "status": "healthy",
            "service": "shadow-oauth",
            "version": env!("CARGO_PKG_VERSION")
        }),
    ))
}
