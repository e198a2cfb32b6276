//! Generic REST client infrastructure.
//!
//! A thin wrapper around `reqwest` with:
//!
//! - Consistent error handling via `RestError`
//! - GET with encoded query parameters, POST with JSON or form bodies
//! - JSON response deserialization
//! - Header injection for authentication
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct TokenResponse {
//!     access_token: String,
//! }
//!
//! let client = RestClient::with_default_timeout("https://openapivts.koreainvestment.com:29443")?;
//! let token: TokenResponse = client.post_json("/oauth2/tokenP", &body, &[]).await?;
//! ```

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
