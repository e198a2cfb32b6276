//! KIS REST API error types.

use auth::AuthError;
use rest_client::RestError;
use strategy_core::{OrderError, QuoteError};
use thiserror::Error;

/// Errors that can occur when interacting with the KIS REST API.
#[derive(Debug, Error)]
pub enum KisRestError {
    /// REST client error (network, timeout, HTTP status).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// KIS answered with `rt_cd != "0"`.
    #[error("KIS API error {code}: {message}")]
    Api { code: String, message: String },

    /// A response field could not be converted.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<KisRestError> for QuoteError {
    fn from(err: KisRestError) -> Self {
        match err {
            KisRestError::Rest(e) => QuoteError::Transport(e.to_string()),
            KisRestError::Api { code, message } => QuoteError::Api { code, message },
            KisRestError::Parse(msg) => QuoteError::Malformed(msg),
        }
    }
}

impl From<KisRestError> for OrderError {
    fn from(err: KisRestError) -> Self {
        match err {
            KisRestError::Rest(e) => OrderError::Transport(e.to_string()),
            KisRestError::Api { code, message } => {
                OrderError::Malformed(format!("{code}: {message}"))
            }
            KisRestError::Parse(msg) => OrderError::Malformed(msg),
        }
    }
}

impl From<KisRestError> for AuthError {
    fn from(err: KisRestError) -> Self {
        match err {
            KisRestError::Rest(RestError::HttpError { status, message }) => {
                AuthError::Rejected { status, message }
            }
            KisRestError::Rest(RestError::Parse(msg)) | KisRestError::Parse(msg) => {
                AuthError::MalformedResponse(msg)
            }
            KisRestError::Rest(e) => AuthError::Transport(e.to_string()),
            KisRestError::Api { code, message } => AuthError::Rejected {
                status: 200,
                message: format!("{code}: {message}"),
            },
        }
    }
}
