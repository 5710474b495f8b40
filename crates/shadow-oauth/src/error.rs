//! Error types for the OAuth server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Every layer has its own enum; [`OAuthError`] is the closed set the HTTP
//! boundary matches on.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};

/// Errors from the persistence layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record with the same unique key already exists
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Kind of record (client, authorization code, ...)
        entity: &'static str,
        /// The colliding key
        key: String,
    },

    /// The backing store failed
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a conflict error.
    #[must_use]
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict { entity, key: key.into() }
    }
}

/// Errors from signing or verifying bearer tokens.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The embedded `exp` is in the past
    #[error("token expired at {expired_at}")]
    Expired {
        /// When the token stopped being valid
        expired_at: DateTime<Utc>,
    },

    /// HMAC did not match
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Header names an algorithm outside the HMAC family
    #[error("token algorithm is not accepted")]
    InvalidAlgorithm,

    /// Not a structurally valid token
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// A valid token of the other kind (session vs. OAuth access)
    #[error("expected {expected} token, found {found}")]
    WrongType {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind the token carries
        found: String,
    },

    /// Encoding failed
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Errors from the identity provider (registration, login, lookup).
#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    WeakPassword {
        /// Minimum accepted length
        min: usize,
    },

    #[error("email is already registered")]
    EmailExists,

    #[error("email or password is incorrect")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    /// Body missing, not JSON, or missing fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Stable machine-readable code for the JSON envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::WeakPassword { .. } => "weak_password",
            Self::EmailExists => "email_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UserNotFound => "user_not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEmail | Self::WeakPassword { .. } | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailExists => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::UserNotFound => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for IdentityError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Protocol endpoint an error is reported from.
///
/// The same error kind can carry a different status depending on where it
/// surfaces (an unknown client is a bad request at `/authorize` but an
/// authentication failure at `/token`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Authorize,
    Token,
    UserInfo,
}

/// Errors from the OAuth protocol steps.
#[derive(thiserror::Error, Debug)]
pub enum OAuthError {
    #[error("unsupported response type")]
    UnsupportedResponseType,

    #[error("unsupported grant type")]
    UnsupportedGrantType,

    #[error("invalid client")]
    InvalidClient,

    #[error("redirect URI does not match the registered URI")]
    RedirectMismatch,

    #[error("login required")]
    AuthenticationRequired,

    /// Not found or expired; the two are deliberately indistinguishable
    #[error("invalid or expired authorization code")]
    InvalidAuthorizationCode,

    /// Replay of a redeemed code
    #[error("authorization code has already been used")]
    AuthorizationCodeUsed,

    /// A required parameter is missing or empty
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing access_token")]
    MissingAccessToken,

    #[error("invalid token: {0}")]
    InvalidToken(TokenError),

    #[error("user not found")]
    UserNotFound,

    /// Store or codec failure; details are logged, never returned
    #[error("internal error: {0}")]
    Internal(String),
}

impl OAuthError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code for the JSON envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidClient => "invalid_client",
            Self::RedirectMismatch => "redirect_mismatch",
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidAuthorizationCode => "invalid_authorization_code",
            Self::AuthorizationCodeUsed => "authorization_code_used",
            Self::InvalidRequest(_) => "invalid_request",
            Self::MissingAccessToken => "missing_access_token",
            Self::InvalidToken(_) => "invalid_token",
            Self::UserNotFound => "user_not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error at the given endpoint.
    #[must_use]
    pub const fn status_code(&self, endpoint: Endpoint) -> StatusCode {
        match self {
            Self::InvalidClient => match endpoint {
                Endpoint::Token => StatusCode::UNAUTHORIZED,
                Endpoint::Authorize | Endpoint::UserInfo => StatusCode::BAD_REQUEST,
            },
            Self::UnsupportedResponseType
            | Self::UnsupportedGrantType
            | Self::RedirectMismatch
            | Self::InvalidAuthorizationCode
            | Self::AuthorizationCodeUsed
            | Self::InvalidRequest(_)
            | Self::MissingAccessToken => StatusCode::BAD_REQUEST,
            Self::AuthenticationRequired | Self::InvalidToken(_) | Self::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for OAuthError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for OAuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(message) => Self::Internal(message),
            other => Self::InvalidToken(other),
        }
    }
}

/// Result type alias for protocol operations.
pub type OAuthResult<T> = Result<T, OAuthError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_client_status_depends_on_endpoint() {
        let err = OAuthError::InvalidClient;
        assert_eq!(err.status_code(Endpoint::Authorize), StatusCode::BAD_REQUEST);
        assert_eq!(err.status_code(Endpoint::Token), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_replay_is_distinguishable_from_invalid_code() {
        assert_ne!(
            OAuthError::AuthorizationCodeUsed.code(),
            OAuthError::InvalidAuthorizationCode.code()
        );
        assert_eq!(
            OAuthError::AuthorizationCodeUsed.status_code(Endpoint::Token),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_token_errors_split_between_caller_and_server() {
        let err: OAuthError = TokenError::InvalidSignature.into();
        assert_eq!(err.status_code(Endpoint::UserInfo), StatusCode::UNAUTHORIZED);

        let err: OAuthError = TokenError::Signing("boom".into()).into();
        assert_eq!(err.status_code(Endpoint::Token), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("boom"));
    }

    #[test]
    fn test_store_conflict_message() {
        let err = StoreError::conflict("client", "abc");
        assert_eq!(err.to_string(), "client already exists: abc");
    }

    #[test]
    fn test_identity_status_codes() {
        assert_eq!(IdentityError::EmailExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(IdentityError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(IdentityError::WeakPassword { min: 6 }.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            IdentityError::InvalidRequest("bad json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
