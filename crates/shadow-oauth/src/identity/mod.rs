//! Identity provider: who the user is.
//!
//! The OAuth services only need two things from it: resolve the caller of a
//! request to a user id, and fetch a user's profile by id. Registration and
//! login are exposed for the HTTP surface and for bootstrapping.

mod local;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use serde::Serialize;

use crate::error::IdentityError;
use crate::models::{User, UserId, UserProfile};

pub use local::LocalIdentityProvider;

/// Result type alias for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// A successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Session token for `Authorization: Bearer`.
    pub token: String,
    pub user: UserProfile,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the authenticated caller of a request, if any.
    async fn resolve_current_user(&self, headers: &HeaderMap) -> Option<UserId>;

    async fn find_user(&self, user_id: UserId) -> IdentityResult<Option<User>>;

    async fn register(&self, email: &str, password: &str, name: &str) -> IdentityResult<User>;

    /// Check credentials and open a session.
    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<LoginResponse>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
