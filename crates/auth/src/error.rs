use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while obtaining or caching an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint refused the credentials.
    #[error("authentication rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The token endpoint could not be reached.
    #[error("authentication request failed: {0}")]
    Transport(String),

    /// The token endpoint answered with something that is not a token.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    /// The token could not be written to the cache file.
    #[error("failed to write token cache {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
