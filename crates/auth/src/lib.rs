//! Authentication for the KIS Open API.
//!
//! - **Credentials**: the app key / app secret pair, with the secret kept in
//!   a `SecretString`.
//! - **Access tokens**: bearer tokens with a fixed six hour validity window.
//! - **Token cache**: a small JSON file so a valid token survives restarts
//!   and the token endpoint is not hit on every refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::TokenCache;
//!
//! let cache = TokenCache::new("data/kis_token.json");
//! let token = match cache.get_valid_token() {
//!     Some(token) => token,
//!     None => {
//!         let token = authenticator.authenticate().await?;
//!         cache.store(token.expose(), token.issued_at())?;
//!         token
//!     }
//! };
//! ```

mod credentials;
mod error;
mod token;
mod token_cache;

pub use credentials::ApiCredentials;
pub use error::AuthError;
pub use token::{default_token_ttl, is_expired, AccessToken, TOKEN_TTL_HOURS};
pub use token_cache::TokenCache;
