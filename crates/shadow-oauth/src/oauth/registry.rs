//! Lookup and validation of registered clients.

use std::sync::Arc;

use crate::error::{OAuthError, OAuthResult, StoreError};
use crate::models::Client;
use crate::store::Store;

/// Validates client ids, secrets and redirect URIs against the store.
#[derive(Clone)]
pub struct ClientRegistry {
    store: Arc<dyn Store>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a client. The redirect URI must be an absolute URL.
    pub async fn register(&self, client: Client) -> OAuthResult<()> {
        url::Url::parse(&client.redirect_uri).map_err(|e| {
            OAuthError::invalid_request(format!("redirect_uri is not an absolute URL: {e}"))
        })?;

        let client_id = client.client_id.clone();
        match self.store.insert_client(client).await {
            Ok(()) => {
                tracing::info!(client_id = %client_id, "Registered OAuth client");
                Ok(())
            }
            Err(StoreError::Conflict { .. }) => {
                Err(OAuthError::invalid_request(format!("client {client_id} already exists")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a client by id alone (authorize step, no secret involved).
    pub async fn validate_client_id(&self, client_id: &str) -> OAuthResult<Client> {
        self.store.find_client(client_id).await?.ok_or(OAuthError::InvalidClient)
    }

    /// Look up a client and check its secret.
    pub async fn validate_client(&self, client_id: &str, client_secret: &str) -> OAuthResult<Client> {
        let client = self.validate_client_id(client_id).await?;
        if !client.secret_matches(client_secret) {
            tracing::warn!(client_id = %client_id, "Client secret mismatch");
            return Err(OAuthError::InvalidClient);
        }
        Ok(client)
    }

    /// Exact match against the client's single registered URI.
    pub fn validate_redirect_uri(client: &Client, redirect_uri: &str) -> OAuthResult<()> {
        if client.redirect_uri_matches(redirect_uri) {
            Ok(())
        } else {
            tracing::warn!(client_id = %client.client_id, "Redirect URI mismatch");
            Err(OAuthError::RedirectMismatch)
        }
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish()
    }
}
