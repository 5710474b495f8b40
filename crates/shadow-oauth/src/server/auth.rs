//! Identity endpoints: register, login, current user.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::transport::HttpState;
use crate::error::IdentityError;
use crate::models::ApiResponse;

fn identity_error(err: &IdentityError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, "Identity request failed");
    }
    let message = match err {
        IdentityError::Internal(_) => "internal server error".to_string(),
        other => other.to_string(),
    };
    (status, Json(ApiResponse::<()>::error(message, err.code()))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// `POST /api/auth/register`
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let req = match req {
        Ok(Json(req)) => req,
        Err(e) => return identity_error(&IdentityError::InvalidRequest(e.body_text())),
    };

    match state.identity.register(&req.email, &req.password, &req.name).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(ApiResponse::success("registration succeeded", user.profile())),
        )
            .into_response(),
        Err(e) => identity_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
pub async fn handle_login(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let req = match req {
        Ok(Json(req)) => req,
        Err(e) => return identity_error(&IdentityError::InvalidRequest(e.body_text())),
    };

    match state.identity.authenticate(&req.email, &req.password).await {
        Ok(login) => Json(ApiResponse::success("login succeeded", login)).into_response(),
        Err(e) => identity_error(&e),
    }
}

/// `GET /api/auth/me`
pub async fn handle_me(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    let Some(user_id) = state.identity.resolve_current_user(&headers).await else {
        let body = ApiResponse::<()>::error("unauthorized", "unauthorized");
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    };

    match state.identity.find_user(user_id).await {
        Ok(Some(user)) => {
            Json(ApiResponse::success("user retrieved", user.profile())).into_response()
        }
        Ok(None) => identity_error(&IdentityError::UserNotFound),
        Err(e) => identity_error(&e),
    }
}
