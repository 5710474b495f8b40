//! Audit record of an issued access token.

use chrono::{DateTime, Utc};

use super::UserId;

/// Stored once per successful token exchange and never mutated.
///
/// Trust comes from the signature and `exp` inside `token`, not from the
/// existence of this record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenRecord {
    pub token: String,
    pub client_id: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    /// Seconds between the record's creation and expiry timestamps.
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.created_at).num_seconds()
    }
}
