//! Tick error types.

use auth::AuthError;
use model::InstrumentCode;
use strategy_core::QuoteError;
use thiserror::Error;

/// Why a tick did not get as far as trigger evaluation.
///
/// Order, notification and persistence problems do not end a tick; they are
/// reported in the [`TickReport`](crate::TickReport).
#[derive(Debug, Error)]
pub enum TickError {
    /// No usable token and authentication failed. Ends the session.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The quote could not be fetched; nothing was evaluated or changed.
    #[error("quote for {code} unavailable: {source}")]
    Quote {
        code: InstrumentCode,
        #[source]
        source: QuoteError,
    },

    #[error("{0} is not on the watchlist")]
    NotWatched(InstrumentCode),
}

impl TickError {
    /// Fatal errors stop the session; the others only skip one instrument.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
