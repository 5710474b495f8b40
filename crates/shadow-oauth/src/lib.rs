//! Shadow OAuth
//!
//! An OAuth 2.0 authorization server implementing the Authorization Code
//! grant (RFC 6749 §4.1) for confidential clients.
//!
//! # Features
//!
//! - **Client registry**: pre-registered clients with exact redirect URI matching
//! - **One-time codes**: 256-bit random codes, 10 minute lifetime, atomic redemption
//! - **Signed access tokens**: HS256 JWTs tagged `oauth_access_token`, never
//!   interchangeable with login session tokens
//! - **Pluggable storage**: the [`store::Store`] trait with an in-memory backend
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shadow_oauth::{Config, MemoryStore, OAuthServer, models::Client};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = OAuthServer::new(&config, Arc::new(MemoryStore::new()));
//!
//!     server
//!         .state()
//!         .oauth
//!         .registry()
//!         .register(Client::new("abc", "s3cret", "Example", "https://app.example/cb"))
//!         .await?;
//!
//!     server.run_http(8080).await
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod oauth;
pub mod server;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Endpoint, IdentityError, OAuthError, StoreError, TokenError};
pub use oauth::{OAuthService, TokenCodec};
pub use server::OAuthServer;
pub use store::{MemoryStore, Store};
