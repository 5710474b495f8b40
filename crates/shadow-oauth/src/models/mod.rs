//! Domain entities: clients, authorization codes, access token records, users,
//! and the JSON response envelope.

mod access_token;
mod authorization_code;
mod client;
mod response;
mod user;

pub use access_token::AccessTokenRecord;
pub use authorization_code::AuthorizationCode;
pub use client::Client;
pub use response::ApiResponse;
pub use user::{User, UserId, UserProfile};
