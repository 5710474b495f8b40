//! Authorization code issuance and redemption.
//!
//! A code moves `Issued -> Used` exactly once. Expiry is computed on read
//! (`now >= expires_at`), so nothing ever has to sweep old codes.

use std::sync::Arc;

use chrono::Duration;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::clock::Clock;
use crate::error::{OAuthError, OAuthResult};
use crate::models::{AuthorizationCode, UserId};
use crate::store::Store;

/// Raw code size: 256 bits, hex-encoded to 64 characters.
pub const CODE_BYTES: usize = 32;

/// Generate a fresh code from the OS CSPRNG.
///
/// Uniqueness rests on the keyspace; there is no collision retry.
#[must_use]
pub fn generate_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues and redeems one-time authorization codes.
#[derive(Clone)]
pub struct AuthorizationCodes {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl AuthorizationCodes {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self { store, clock, lifetime }
    }

    /// Issue and persist a code. The caller has already authenticated the
    /// user and validated the client and redirect URI.
    pub async fn issue(
        &self,
        client_id: &str,
        user_id: UserId,
        redirect_uri: &str,
    ) -> OAuthResult<String> {
        let code = generate_code();
        let record = AuthorizationCode::issue(
            code.clone(),
            client_id.to_owned(),
            user_id,
            redirect_uri.to_owned(),
            self.clock.now(),
            self.lifetime,
        );
        self.store.insert_authorization_code(record).await?;

        tracing::info!(client_id = %client_id, user_id, "Issued authorization code");
        Ok(code)
    }

    /// Redeem a code issued to `client_id`.
    ///
    /// Unknown and expired unused codes yield `InvalidAuthorizationCode`; a
    /// code that was already redeemed (or is redeemed concurrently by someone
    /// else) yields `AuthorizationCodeUsed`, whether or not it has expired.
    pub async fn redeem(&self, code: &str, client_id: &str) -> OAuthResult<AuthorizationCode> {
        let Some(mut auth_code) = self.store.find_authorization_code(code, client_id).await? else {
            return Err(OAuthError::InvalidAuthorizationCode);
        };

        if !auth_code.is_valid(self.clock.now()) {
            // A replay stays visible as a replay, even after expiry
            if auth_code.used {
                tracing::warn!(client_id = %client_id, user_id = auth_code.user_id, "Authorization code replay");
                return Err(OAuthError::AuthorizationCodeUsed);
            }
            return Err(OAuthError::InvalidAuthorizationCode);
        }

        if !self.store.consume_authorization_code(code, client_id).await? {
            tracing::warn!(client_id = %client_id, user_id = auth_code.user_id, "Lost authorization code redemption race");
            return Err(OAuthError::AuthorizationCodeUsed);
        }

        auth_code.used = true;
        Ok(auth_code)
    }
}

impl std::fmt::Debug for AuthorizationCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationCodes").field("lifetime", &self.lifetime).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn codes() -> (AuthorizationCodes, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let codes =
            AuthorizationCodes::new(Arc::new(MemoryStore::new()), clock.clone(), Duration::minutes(10));
        (codes, clock)
    }

    #[test]
    fn test_generated_code_format() {
        let code = generate_code();
        assert_eq!(code.len(), 64);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(code, generate_code());
    }

    #[tokio::test]
    async fn test_redeem_once() {
        let (codes, _) = codes();
        let code = codes.issue("abc", 7, "https://app.example/cb").await.unwrap();

        let redeemed = codes.redeem(&code, "abc").await.unwrap();
        assert_eq!(redeemed.user_id, 7);
        assert_eq!(redeemed.redirect_uri, "https://app.example/cb");
        assert!(redeemed.used);

        assert!(matches!(
            codes.redeem(&code, "abc").await.unwrap_err(),
            OAuthError::AuthorizationCodeUsed
        ));
    }

    #[tokio::test]
    async fn test_code_bound_to_client() {
        let (codes, _) = codes();
        let code = codes.issue("abc", 7, "https://app.example/cb").await.unwrap();

        assert!(matches!(
            codes.redeem(&code, "other").await.unwrap_err(),
            OAuthError::InvalidAuthorizationCode
        ));
        // The failed attempt did not burn the code
        assert!(codes.redeem(&code, "abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let (codes, clock) = codes();
        let code = codes.issue("abc", 7, "https://app.example/cb").await.unwrap();

        clock.advance(Duration::minutes(10));
        assert!(matches!(
            codes.redeem(&code, "abc").await.unwrap_err(),
            OAuthError::InvalidAuthorizationCode
        ));
    }

    #[tokio::test]
    async fn test_used_then_expired_reports_replay() {
        let (codes, clock) = codes();
        let code = codes.issue("abc", 7, "https://app.example/cb").await.unwrap();
        codes.redeem(&code, "abc").await.unwrap();

        clock.advance(Duration::minutes(11));
        assert!(matches!(
            codes.redeem(&code, "abc").await.unwrap_err(),
            OAuthError::AuthorizationCodeUsed
        ));
    }

    #[tokio::test]
    async fn test_unknown_code_rejected() {
        let (codes, _) = codes();
        assert!(matches!(
            codes.redeem(&generate_code(), "abc").await.unwrap_err(),
            OAuthError::InvalidAuthorizationCode
        ));
    }
}
