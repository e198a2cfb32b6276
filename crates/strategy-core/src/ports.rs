//! Collaborator interfaces the session drives.
//!
//! Every authenticated call takes the bearer token explicitly, so
//! implementations hold no token state of their own.

use async_trait::async_trait;
use auth::{AccessToken, AuthError};
use chrono::NaiveDate;
use model::{InstrumentCode, OrderOutcome, OrderSide, PriceBar, Quote};

use crate::error::{OrderError, QuoteError};

/// Obtains a fresh access token from the brokerage.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken, AuthError>;
}

/// Current prices and daily history.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    async fn current_price(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Quote, QuoteError>;

    /// Daily bars in `[from, to]`, ascending by date.
    async fn daily_bars(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, QuoteError>;
}

/// Display-name lookup.
#[async_trait]
pub trait InstrumentDirectory: Send + Sync {
    /// `Ok(None)` when the brokerage does not know the code.
    async fn lookup_name(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
    ) -> Result<Option<String>, QuoteError>;
}

/// Market order submission.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit_market_order(
        &self,
        token: &AccessToken,
        code: &InstrumentCode,
        quantity: u32,
        side: OrderSide,
    ) -> Result<OrderOutcome, OrderError>;
}

/// Best-effort push notification. Returns whether delivery succeeded;
/// implementations never fail the caller.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> bool;
}
