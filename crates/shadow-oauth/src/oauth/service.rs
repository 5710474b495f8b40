//! The Authorize / Token / UserInfo protocol steps.
//!
//! Each step checks its preconditions in a fixed order and stops at the
//! first failure. The order is part of the contract: callers (and tests)
//! rely on, say, a wrong grant type being reported before a wrong secret.

use std::sync::Arc;

use serde::Serialize;

use super::codec::TokenCodec;
use super::codes::AuthorizationCodes;
use super::registry::ClientRegistry;
use super::tokens::AccessTokens;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{OAuthError, OAuthResult};
use crate::identity::IdentityProvider;
use crate::models::{UserId, UserProfile};
use crate::store::Store;

/// The only supported `response_type`.
pub const RESPONSE_TYPE_CODE: &str = "code";

/// The only supported `grant_type`.
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// Parameters of an authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    /// Opaque caller state, echoed back unvalidated.
    pub state: Option<String>,
}

/// Where to send the user agent after a successful authorization.
#[derive(Debug, Clone)]
pub struct AuthorizationGrant {
    pub code: String,
    /// `redirect_uri` with `code` (and `state`) appended.
    pub location: String,
}

/// Parameters of a token request.
#[derive(Clone)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Successful token endpoint body.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Orchestrates clients, codes, tokens and the identity provider.
#[derive(Clone)]
pub struct OAuthService {
    registry: ClientRegistry,
    codes: AuthorizationCodes,
    tokens: AccessTokens,
    codec: Arc<TokenCodec>,
    identity: Arc<dyn IdentityProvider>,
}

impl OAuthService {
    #[must_use]
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        codec: Arc<TokenCodec>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: ClientRegistry::new(Arc::clone(&store)),
            codes: AuthorizationCodes::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                config.auth_code_lifetime,
            ),
            tokens: AccessTokens::new(store, Arc::clone(&codec), clock, config.access_token_lifetime),
            codec,
            identity,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Authorization endpoint.
    ///
    /// 1. `response_type` must be `code`
    /// 2. the client must exist
    /// 3. `redirect_uri` must equal the registered URI
    /// 4. a user must be authenticated
    ///
    /// Then a code is issued and the redirect location built.
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        user_id: Option<UserId>,
    ) -> OAuthResult<AuthorizationGrant> {
        if request.response_type != RESPONSE_TYPE_CODE {
            return Err(OAuthError::UnsupportedResponseType);
        }

        let client = self.registry.validate_client_id(&request.client_id).await?;
        ClientRegistry::validate_redirect_uri(&client, &request.redirect_uri)?;

        let Some(user_id) = user_id else {
            return Err(OAuthError::AuthenticationRequired);
        };

        let code = self.codes.issue(&client.client_id, user_id, &request.redirect_uri).await?;
        let location = redirect_location(&request.redirect_uri, &code, request.state.as_deref())?;

        Ok(AuthorizationGrant { code, location })
    }

    /// Token endpoint.
    ///
    /// 1. `grant_type` must be `authorization_code`
    /// 2. client id and secret must match
    /// 3. `redirect_uri` must equal the registered URI
    /// 4. the code must exist for this client, be unexpired and unused
    ///
    /// Then the code is consumed atomically and a token minted.
    pub async fn exchange_authorization_code(
        &self,
        request: &TokenRequest,
    ) -> OAuthResult<TokenResponse> {
        if request.grant_type != GRANT_TYPE_AUTHORIZATION_CODE {
            return Err(OAuthError::UnsupportedGrantType);
        }

        let client = self.registry.validate_client(&request.client_id, &request.client_secret).await?;
        ClientRegistry::validate_redirect_uri(&client, &request.redirect_uri)?;

        let auth_code = self.codes.redeem(&request.code, &client.client_id).await?;
        let record = self.tokens.mint(auth_code.user_id, &client.client_id).await?;

        Ok(TokenResponse {
            access_token: record.token.clone(),
            token_type: "Bearer",
            expires_in: record.expires_in(),
        })
    }

    /// UserInfo endpoint: resolve an OAuth access token to a profile.
    pub async fn get_user_info(&self, access_token: &str) -> OAuthResult<UserProfile> {
        let claims = self.codec.verify_access_token(access_token)?;

        let user = self
            .identity
            .find_user(claims.user_id)
            .await
            .map_err(|e| OAuthError::internal(e.to_string()))?
            .ok_or(OAuthError::UserNotFound)?;

        tracing::debug!(client_id = %claims.client_id, user_id = user.id, "Served user info");
        Ok(user.profile())
    }
}

impl std::fmt::Debug for OAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthService").finish()
    }
}

/// Append `code` and `state` to the redirect URI, keeping any query it
/// already has. An empty `state` is treated as absent.
fn redirect_location(redirect_uri: &str, code: &str, state: Option<&str>) -> OAuthResult<String> {
    let mut url = url::Url::parse(redirect_uri)
        .map_err(|e| OAuthError::internal(format!("registered redirect URI does not parse: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("code", code);
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            query.append_pair("state", state);
        }
    }

    Ok(url.into())
}
