//! One-time authorization codes.

use chrono::{DateTime, Duration, Utc};

use super::UserId;

/// An authorization code bound to (client, user, redirect URI).
///
/// `used` only ever moves from `false` to `true`. Expiry is not a stored
/// state: it is derived from `expires_at` at read time, and once reached it
/// makes the code permanently invalid whatever `used` says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub user_id: UserId,
    pub redirect_uri: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthorizationCode {
    #[must_use]
    pub fn issue(
        code: String,
        client_id: String,
        user_id: UserId,
        redirect_uri: String,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            code,
            client_id,
            user_id,
            redirect_uri,
            expires_at: issued_at + lifetime,
            used: false,
            created_at: issued_at,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired(now)
    }
}
