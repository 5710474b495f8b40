//! HTTP server for the OAuth 2.0 authorization code flow.
//!
//! Wires the store, token codec, identity provider and protocol service
//! together and serves them over axum.

pub mod auth;
pub mod handlers;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::identity::{IdentityProvider, LocalIdentityProvider};
use crate::oauth::{OAuthService, TokenCodec};
use crate::store::Store;

pub use transport::{HttpState, create_router};

/// OAuth authorization server.
pub struct OAuthServer {
    state: Arc<HttpState>,
    cors_origin: String,
}

impl OAuthServer {
    /// Create a server on the wall clock.
    #[must_use]
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a server with an explicit time source.
    #[must_use]
    pub fn with_clock(config: &Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.jwt_secret, Arc::clone(&clock)));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(config, Arc::clone(&codec), Arc::clone(&clock)));
        let oauth = OAuthService::new(config, store, codec, Arc::clone(&identity), clock);

        Self {
            state: Arc::new(HttpState { oauth, identity }),
            cors_origin: config.cors_origin.clone(),
        }
    }

    /// Shared handler state.
    #[must_use]
    pub const fn state(&self) -> &Arc<HttpState> {
        &self.state
    }

    /// Build the router without binding a socket.
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), &self.cors_origin)
    }

    /// Serve HTTP until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server fails.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for OAuthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthServer").field("cors_origin", &self.cors_origin).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
