//! Signing and verification of bearer tokens.
//!
//! Session tokens and OAuth access tokens share one HMAC secret and one wire
//! format (JWT). They are told apart by the `type` claim: OAuth access
//! tokens carry `"type": "oauth_access_token"`, session tokens carry no type
//! at all. Each verifier accepts only its own kind.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::TokenError;
use crate::models::UserId;

/// Value of the `type` claim on OAuth access tokens.
pub const OAUTH_ACCESS_TOKEN_TYPE: &str = "oauth_access_token";

/// Kind label used in errors for tokens without a `type` claim.
const SESSION_TOKEN_KIND: &str = "session";

/// Algorithms accepted on verification. Anything outside the HMAC family is
/// rejected before the signature is checked.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims of a login session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// The only accepted value of the `type` claim on access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessTokenType {
    #[serde(rename = "oauth_access_token")]
    OAuthAccessToken,
}

/// Claims of an OAuth access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthAccessClaims {
    pub user_id: UserId,
    pub client_id: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: AccessTokenType,
    /// Random id so two tokens minted in the same second differ.
    pub jti: String,
}

/// Either claim shape, decided by the `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClaims {
    Session(SessionClaims),
    OAuthAccess(OAuthAccessClaims),
}

impl TokenClaims {
    #[must_use]
    pub const fn exp(&self) -> i64 {
        match self {
            Self::Session(c) => c.exp,
            Self::OAuthAccess(c) => c.exp,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Session(c) => c.user_id,
            Self::OAuthAccess(c) => c.user_id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => SESSION_TOKEN_KIND,
            Self::OAuthAccess(_) => OAUTH_ACCESS_TOKEN_TYPE,
        }
    }

    /// Read the discriminator, then decode into the matching strict shape.
    fn from_value(value: serde_json::Value) -> Result<Self, TokenError> {
        let tag = match value.get("type") {
            None => None,
            Some(serde_json::Value::String(tag)) => Some(tag.clone()),
            Some(_) => return Err(TokenError::Malformed("type claim is not a string".into())),
        };

        match tag.as_deref() {
            None => serde_json::from_value(value)
                .map(Self::Session)
                .map_err(|e| TokenError::Malformed(format!("invalid session claims: {e}"))),
            Some(OAUTH_ACCESS_TOKEN_TYPE) => serde_json::from_value(value)
                .map(Self::OAuthAccess)
                .map_err(|e| TokenError::Malformed(format!("invalid access token claims: {e}"))),
            Some(other) => Err(TokenError::Malformed(format!("unknown token type: {other}"))),
        }
    }
}

/// Stateless HMAC-SHA256 token codec.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Expiry is checked against our own clock, without leeway
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Sign claims with HS256.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);
        let result = match claims {
            TokenClaims::Session(c) => encode(&header, c, &self.encoding_key),
            TokenClaims::OAuthAccess(c) => encode(&header, c, &self.encoding_key),
        };
        result.map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue a session token valid for `lifetime` from now.
    pub fn issue_session(
        &self,
        user_id: UserId,
        lifetime: Duration,
    ) -> Result<(String, SessionClaims), TokenError> {
        let now = self.clock.now().timestamp();
        let claims = SessionClaims { user_id, iat: now, exp: now + lifetime.num_seconds() };
        let token = self.sign(&TokenClaims::Session(claims.clone()))?;
        Ok((token, claims))
    }

    /// Issue an OAuth access token stamped at `issued_at`.
    pub fn issue_access_token(
        &self,
        user_id: UserId,
        client_id: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<(String, OAuthAccessClaims), TokenError> {
        let iat = issued_at.timestamp();
        let claims = OAuthAccessClaims {
            user_id,
            client_id: client_id.to_owned(),
            iat,
            exp: iat + lifetime.num_seconds(),
            token_type: AccessTokenType::OAuthAccessToken,
            jti: uuid::Uuid::new_v4().simple().to_string(),
        };
        let token = self.sign(&TokenClaims::OAuthAccess(claims.clone()))?;
        Ok((token, claims))
    }

    /// Check algorithm, signature and expiry; return whichever claim shape
    /// the token carries.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| convert_jwt_error(&e))?;
        let claims = TokenClaims::from_value(data.claims)?;

        let now = self.clock.now();
        if now.timestamp() >= claims.exp() {
            let expired_at = DateTime::from_timestamp(claims.exp(), 0).unwrap_or(now);
            tracing::debug!(user_id = claims.user_id(), kind = claims.kind(), %expired_at, "Token expired");
            return Err(TokenError::Expired { expired_at });
        }

        Ok(claims)
    }

    /// Verify a session token. OAuth access tokens are rejected.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        match self.verify(token)? {
            TokenClaims::Session(claims) => Ok(claims),
            other => Err(TokenError::WrongType {
                expected: SESSION_TOKEN_KIND,
                found: other.kind().to_string(),
            }),
        }
    }

    /// Verify an OAuth access token. Session tokens are rejected.
    pub fn verify_access_token(&self, token: &str) -> Result<OAuthAccessClaims, TokenError> {
        match self.verify(token)? {
            TokenClaims::OAuthAccess(claims) => Ok(claims),
            other => Err(TokenError::WrongType {
                expected: OAUTH_ACCESS_TOKEN_TYPE,
                found: other.kind().to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish()
    }
}

fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => TokenError::InvalidAlgorithm,
        _ => TokenError::Malformed(e.to_string()),
    }
}
