//! In-process identity provider with bcrypt passwords and session tokens.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Duration;
use regex::Regex;
use tokio::sync::RwLock;

use super::{IdentityProvider, IdentityResult, LoginResponse, bearer_token};
use crate::clock::Clock;
use crate::config::{Config, defaults};
use crate::error::IdentityError;
use crate::models::{User, UserId};
use crate::oauth::TokenCodec;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").ok()
});

/// Users held in memory; sessions are stateless signed tokens.
pub struct LocalIdentityProvider {
    users: RwLock<HashMap<UserId, User>>,
    next_id: AtomicU64,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    session_lifetime: Duration,
    bcrypt_cost: u32,
}

impl LocalIdentityProvider {
    #[must_use]
    pub fn new(config: &Config, codec: Arc<TokenCodec>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            codec,
            clock,
            session_lifetime: config.session_lifetime,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.values().find(|u| u.email == email).cloned()
    }
}

impl std::fmt::Debug for LocalIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentityProvider")
            .field("session_lifetime", &self.session_lifetime)
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn resolve_current_user(&self, headers: &HeaderMap) -> Option<UserId> {
        let token = bearer_token(headers)?;
        match self.codec.verify_session(token) {
            Ok(claims) => Some(claims.user_id),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    async fn find_user(&self, user_id: UserId) -> IdentityResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> IdentityResult<User> {
        if !EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email)) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < defaults::MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword { min: defaults::MIN_PASSWORD_LENGTH });
        }
        if self.find_by_email(email).await.is_some() {
            return Err(IdentityError::EmailExists);
        }

        // bcrypt is CPU-bound; keep it off the async workers
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let mut users = self.users.write().await;
        // Re-check under the write lock: another registration may have won
        if users.values().any(|u| u.email == email) {
            return Err(IdentityError::EmailExists);
        }

        let now = self.clock.now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: email.to_owned(),
            password_hash,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, "Registered user");
        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<LoginResponse> {
        let Some(user) = self.find_by_email(email).await else {
            return Err(IdentityError::InvalidCredentials);
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        if !matches {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        let (token, _claims) = self.codec.issue_session(user.id, self.session_lifetime)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResponse { token, user: user.profile() })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, header};

    use super::*;
    use crate::clock::ManualClock;

    fn provider() -> (LocalIdentityProvider, Arc<TokenCodec>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(TokenCodec::new("secret", clock.clone()));
        let provider = LocalIdentityProvider::new(&Config::for_testing(), codec.clone(), clock.clone());
        (provider, codec, clock)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (provider, _, _) = provider();
        let user = provider.register("ada@example.com", "hunter22", "Ada").await.unwrap();
        assert_eq!(user.id, 1);
        assert_ne!(user.password_hash, "hunter22");

        let login = provider.authenticate("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(login.user.id, user.id);
        assert_eq!(provider.resolve_current_user(&bearer(&login.token)).await, Some(user.id));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (provider, _, _) = provider();
        assert!(matches!(
            provider.register("not-an-email", "hunter22", "").await.unwrap_err(),
            IdentityError::InvalidEmail
        ));
        assert!(matches!(
            provider.register("ada@example.com", "short", "").await.unwrap_err(),
            IdentityError::WeakPassword { min: 6 }
        ));

        provider.register("ada@example.com", "hunter22", "").await.unwrap();
        assert!(matches!(
            provider.register("ada@example.com", "another1", "").await.unwrap_err(),
            IdentityError::EmailExists
        ));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (provider, _, _) = provider();
        provider.register("ada@example.com", "hunter22", "Ada").await.unwrap();
        assert!(matches!(
            provider.authenticate("ada@example.com", "hunter23").await.unwrap_err(),
            IdentityError::InvalidCredentials
        ));
        assert!(matches!(
            provider.authenticate("bob@example.com", "hunter22").await.unwrap_err(),
            IdentityError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_session() {
        let (provider, codec, clock) = provider();
        let (token, _) = codec.issue_access_token(1, "abc", clock.now(), Duration::hours(1)).unwrap();
        assert_eq!(provider.resolve_current_user(&bearer(&token)).await, None);
        assert_eq!(provider.resolve_current_user(&HeaderMap::new()).await, None);
    }

    #[tokio::test]
    async fn test_expired_session_not_resolved() {
        let (provider, _, clock) = provider();
        provider.register("ada@example.com", "hunter22", "Ada").await.unwrap();
        let login = provider.authenticate("ada@example.com", "hunter22").await.unwrap();

        clock.advance(Duration::hours(24));
        assert_eq!(provider.resolve_current_user(&bearer(&login.token)).await, None);
    }
}
