//! In-memory store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{AccessTokenRecord, AuthorizationCode, Client};

/// Process-local store backed by `RwLock`-guarded maps.
///
/// Nothing is ever evicted: expired codes and token records stay until the
/// process exits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    clients: Arc<RwLock<HashMap<String, Client>>>,
    auth_codes: Arc<RwLock<HashMap<String, AuthorizationCode>>>,
    access_tokens: Arc<RwLock<HashMap<String, AccessTokenRecord>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of authorization codes held, used or not.
    pub async fn authorization_code_count(&self) -> usize {
        self.auth_codes.read().await.len()
    }

    /// Number of access token records held.
    pub async fn access_token_count(&self) -> usize {
        self.access_tokens.read().await.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_client(&self, client: Client) -> StoreResult<()> {
        match self.clients.write().await.entry(client.client_id.clone()) {
            Entry::Occupied(entry) => Err(StoreError::conflict("client", entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(client);
                Ok(())
            }
        }
    }

    async fn find_client(&self, client_id: &str) -> StoreResult<Option<Client>> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }

    async fn insert_authorization_code(&self, code: AuthorizationCode) -> StoreResult<()> {
        match self.auth_codes.write().await.entry(code.code.clone()) {
            // Never echo the colliding code itself
            Entry::Occupied(_) => Err(StoreError::conflict("authorization code", "<redacted>")),
            Entry::Vacant(entry) => {
                entry.insert(code);
                Ok(())
            }
        }
    }

    async fn find_authorization_code(
        &self,
        code: &str,
        client_id: &str,
    ) -> StoreResult<Option<AuthorizationCode>> {
        let codes = self.auth_codes.read().await;
        Ok(codes.get(code).filter(|c| c.client_id == client_id).cloned())
    }

    async fn consume_authorization_code(&self, code: &str, client_id: &str) -> StoreResult<bool> {
        // Check and set under one write guard
        let mut codes = self.auth_codes.write().await;
        match codes.get_mut(code) {
            Some(auth_code) if auth_code.client_id == client_id && !auth_code.used => {
                auth_code.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_access_token(&self, record: AccessTokenRecord) -> StoreResult<()> {
        match self.access_tokens.write().await.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::conflict("access token", "<redacted>")),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    async fn find_access_token(&self, token: &str) -> StoreResult<Option<AccessTokenRecord>> {
        Ok(self.access_tokens.read().await.get(token).cloned())
    }
}
