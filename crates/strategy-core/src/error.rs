//! Error types for configuration and the collaborator ports.

use rust_decimal::Decimal;
use thiserror::Error;

/// An [`InstrumentConfig`](crate::InstrumentConfig) that cannot be evaluated safely.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Order quantity must be at least one share.
    #[error("order quantity must be positive")]
    ZeroQuantity,

    /// Manual prices are absolute and cannot be negative (zero means unset).
    #[error("{side} manual price must not be negative: {price}")]
    NegativeManualPrice { side: &'static str, price: Decimal },

    /// Buy percent must be at or below the reference, and above -100%.
    #[error("buy percent must be in (-100, 0]: {0}")]
    BuyPercentOutOfRange(Decimal),

    /// Sell percent must be at or above the reference.
    #[error("sell percent must be >= 0: {0}")]
    SellPercentOutOfRange(Decimal),

    /// Buy trigger at or above the sell trigger would let both legs fire at once.
    #[error("buy trigger {buy} is not below sell trigger {sell}")]
    InvertedTargets { buy: Decimal, sell: Decimal },
}

/// Failure to fetch prices or instrument metadata.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Network failure or non-success HTTP status.
    #[error("quote request failed: {0}")]
    Transport(String),

    /// The quote service answered with an error code.
    #[error("quote service error {code}: {message}")]
    Api { code: String, message: String },

    /// A field could not be parsed.
    #[error("malformed quote data: {0}")]
    Malformed(String),
}

/// Failure to submit an order at all. A brokerage refusal is not an error:
/// it comes back as [`OrderOutcome::Rejected`](model::OrderOutcome::Rejected).
#[derive(Debug, Error)]
pub enum OrderError {
    /// Network failure or non-success HTTP status.
    #[error("order request failed: {0}")]
    Transport(String),

    /// The order endpoint answered with something unreadable.
    #[error("malformed order response: {0}")]
    Malformed(String),

    /// Live orders need an account; none is configured.
    #[error("no brokerage account configured")]
    NoAccount,
}
