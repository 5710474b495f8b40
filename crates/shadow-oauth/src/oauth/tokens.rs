//! Minting and recording OAuth access tokens.

use std::sync::Arc;

use chrono::Duration;

use super::codec::TokenCodec;
use crate::clock::Clock;
use crate::error::OAuthResult;
use crate::models::{AccessTokenRecord, UserId};
use crate::store::Store;

/// Mints signed access tokens and keeps an audit record of each.
#[derive(Clone)]
pub struct AccessTokens {
    store: Arc<dyn Store>,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl AccessTokens {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
        lifetime: Duration,
    ) -> Self {
        Self { store, codec, clock, lifetime }
    }

    /// Mint a token bound to `(user_id, client_id)` and persist its record.
    ///
    /// The claims and the record are stamped from the same clock reading.
    pub async fn mint(&self, user_id: UserId, client_id: &str) -> OAuthResult<AccessTokenRecord> {
        let now = self.clock.now();
        let (token, _claims) = self.codec.issue_access_token(user_id, client_id, now, self.lifetime)?;

        let record = AccessTokenRecord {
            token,
            client_id: client_id.to_owned(),
            user_id,
            expires_at: now + self.lifetime,
            created_at: now,
        };
        self.store.insert_access_token(record.clone()).await?;

        tracing::info!(client_id = %client_id, user_id, "Issued access token");
        Ok(record)
    }
}

impl std::fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokens").field("lifetime", &self.lifetime).finish()
    }
}
