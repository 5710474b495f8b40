//! OAuth 2.0 endpoint handlers.
//!
//! Thin adapters: pull parameters out of the request, call
//! [`OAuthService`](crate::oauth::OAuthService), and render the result.
//! Every error goes through [`error_response`].

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::transport::HttpState;
use crate::error::{Endpoint, OAuthError};
use crate::identity::bearer_token;
use crate::models::ApiResponse;
use crate::oauth::{AuthorizeRequest, TokenRequest, TokenResponse};

/// Render an error as the JSON envelope with the status for `endpoint`.
pub fn error_response(err: &OAuthError, endpoint: Endpoint) -> Response {
    let status = err.status_code(endpoint);
    if status.is_server_error() {
        tracing::error!(?endpoint, error = %err, "Request failed");
    } else {
        tracing::debug!(?endpoint, code = err.code(), "Request rejected");
    }

    (status, Json(ApiResponse::<()>::error(err.public_message(), err.code()))).into_response()
}

/// A request the extractor could not parse is an invalid request, reported
/// in the usual envelope rather than axum's plain-text rejection.
fn rejected(rejection: &impl std::fmt::Display) -> OAuthError {
    OAuthError::invalid_request(rejection.to_string())
}

fn required(value: Option<String>, name: &str) -> Result<String, OAuthError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::invalid_request(format!("missing {name}")))
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
}

impl TryFrom<AuthorizeQuery> for AuthorizeRequest {
    type Error = OAuthError;

    fn try_from(query: AuthorizeQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            client_id: required(query.client_id, "client_id")?,
            redirect_uri: required(query.redirect_uri, "redirect_uri")?,
            response_type: required(query.response_type, "response_type")?,
            state: query.state,
        })
    }
}

/// `GET /oauth/authorize`
///
/// The user must already be logged in (session token in the
/// `Authorization` header). On success, redirects to the client with a code.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> Response {
    let parsed = query.map_err(|e| rejected(&e));
    let request = match parsed.and_then(|Query(q)| AuthorizeRequest::try_from(q)) {
        Ok(request) => request,
        Err(e) => return error_response(&e, Endpoint::Authorize),
    };

    let user_id = state.identity.resolve_current_user(&headers).await;

    match state.oauth.authorize(&request, user_id).await {
        Ok(grant) => (StatusCode::FOUND, [(header::LOCATION, grant.location)]).into_response(),
        Err(e) => error_response(&e, Endpoint::Authorize),
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl TryFrom<TokenForm> for TokenRequest {
    type Error = OAuthError;

    fn try_from(form: TokenForm) -> Result<Self, Self::Error> {
        Ok(Self {
            grant_type: required(form.grant_type, "grant_type")?,
            code: required(form.code, "code")?,
            redirect_uri: required(form.redirect_uri, "redirect_uri")?,
            client_id: required(form.client_id, "client_id")?,
            client_secret: required(form.client_secret, "client_secret")?,
        })
    }
}

/// `POST /oauth/token`
///
/// Exchange an authorization code for an access token.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
    let parsed = form.map_err(|e| rejected(&e));
    let request = match parsed.and_then(|Form(f)| TokenRequest::try_from(f)) {
        Ok(request) => request,
        Err(e) => return error_response(&e, Endpoint::Token),
    };

    match state.oauth.exchange_authorization_code(&request).await {
        Ok(token) => token_success(&token),
        Err(e) => error_response(&e, Endpoint::Token),
    }
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(token: &TokenResponse) -> Response {
    let mut response = Json(token).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

// ─── UserInfo Endpoint ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserInfoQuery {
    pub access_token: Option<String>,
}

/// `GET /oauth/userinfo`
///
/// The token is read from the `access_token` query parameter first and only
/// then from `Authorization: Bearer`.
pub async fn handle_userinfo(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    query: Result<Query<UserInfoQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => return error_response(&rejected(&e), Endpoint::UserInfo),
    };

    let token = query
        .access_token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers).map(str::to_owned));

    let Some(token) = token else {
        return error_response(&OAuthError::MissingAccessToken, Endpoint::UserInfo);
    };

    match state.oauth.get_user_info(&token).await {
        Ok(profile) => Json(ApiResponse::success("user info retrieved", profile)).into_response(),
        Err(e) => error_response(&e, Endpoint::UserInfo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_form_requires_every_field() {
        let form = TokenForm {
            grant_type: Some("authorization_code".into()),
            code: Some("c0de".into()),
            redirect_uri: Some("https://app.example/cb".into()),
            client_id: Some("abc".into()),
            client_secret: None,
        };
        let err = TokenRequest::try_from(form).unwrap_err();
        assert!(matches!(err, OAuthError::InvalidRequest(ref m) if m.contains("client_secret")));
    }

    #[test]
    fn test_authorize_query_state_is_optional() {
        let query = AuthorizeQuery {
            client_id: Some("abc".into()),
            redirect_uri: Some("https://app.example/cb".into()),
            response_type: Some("code".into()),
            state: None,
        };
        let request = AuthorizeRequest::try_from(query).unwrap();
        assert!(request.state.is_none());
    }

    #[test]
    fn test_empty_parameter_counts_as_missing() {
        assert!(required(Some(String::new()), "code").is_err());
        assert_eq!(required(Some("x".into()), "code").unwrap(), "x");
    }
}
