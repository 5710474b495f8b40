//! Persistence contract for clients, authorization codes and access token records.
//!
//! Services receive an `Arc<dyn Store>` at construction; nothing reaches a
//! global handle.

mod memory;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{AccessTokenRecord, AuthorizationCode, Client};

pub use memory::MemoryStore;

/// Keyed create/find plus the conditional update that makes code redemption
/// race-free.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a client. Fails with `Conflict` if the id is taken.
    async fn insert_client(&self, client: Client) -> StoreResult<()>;

    async fn find_client(&self, client_id: &str) -> StoreResult<Option<Client>>;

    /// Insert a freshly issued code. Fails with `Conflict` if the code exists.
    async fn insert_authorization_code(&self, code: AuthorizationCode) -> StoreResult<()>;

    /// Look up a code issued to `client_id`. A code issued to another client
    /// is reported as absent.
    async fn find_authorization_code(
        &self,
        code: &str,
        client_id: &str,
    ) -> StoreResult<Option<AuthorizationCode>>;

    /// Atomically `set used = true where code = ? and client_id = ? and used = false`.
    ///
    /// Returns `true` only for the single caller whose update took effect.
    async fn consume_authorization_code(&self, code: &str, client_id: &str) -> StoreResult<bool>;

    /// Insert an access token record. Fails with `Conflict` on a duplicate token.
    async fn insert_access_token(&self, record: AccessTokenRecord) -> StoreResult<()>;

    async fn find_access_token(&self, token: &str) -> StoreResult<Option<AccessTokenRecord>>;
}
