//! Registered third-party application.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

/// A registered OAuth client.
///
/// Immutable after registration. The secret never leaves the process:
/// `Debug` redacts it and the type is not serializable.
#[derive(Clone)]
pub struct Client {
    pub client_id: String,
    pub client_secret: String,
    pub name: String,
    /// The single redirect URI this client may use.
    pub redirect_uri: String,
    pub created_at: DateTime<Utc>,
}

impl Client {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        name: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            name: name.into(),
            redirect_uri: redirect_uri.into(),
            created_at: Utc::now(),
        }
    }

    /// Compare a presented secret in constant time.
    #[must_use]
    pub fn secret_matches(&self, presented: &str) -> bool {
        self.client_secret.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    /// Exact string comparison; no prefix or pattern matching.
    #[must_use]
    pub fn redirect_uri_matches(&self, presented: &str) -> bool {
        self.redirect_uri == presented
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("name", &self.name)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
