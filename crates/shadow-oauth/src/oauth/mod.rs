//! OAuth 2.0 authorization code grant.
//!
//! - [`registry`]: registered clients
//! - [`codes`]: one-time authorization codes
//! - [`tokens`]: access token minting and audit records
//! - [`codec`]: HMAC-signed bearer tokens (session and OAuth)
//! - [`service`]: the Authorize / Token / UserInfo steps

pub mod codec;
pub mod codes;
pub mod registry;
pub mod service;
pub mod tokens;

pub use codec::{OAuthAccessClaims, SessionClaims, TokenClaims, TokenCodec};
pub use codes::AuthorizationCodes;
pub use registry::ClientRegistry;
pub use service::{AuthorizationGrant, AuthorizeRequest, OAuthService, TokenRequest, TokenResponse};
pub use tokens::AccessTokens;
