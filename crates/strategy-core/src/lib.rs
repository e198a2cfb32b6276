//! Decision logic for the trading assistant.
//!
//! - **Instrument config**: `InstrumentConfig` and its buy/sell `TriggerRule`s
//! - **Trigger engine**: `TriggerEngine::evaluate` decides which legs fire,
//!   `DispatchState` records fills so each leg fires at most once per day
//! - **Signals**: `SignalEvaluator::analyze` scores daily bars for display
//! - **Ports**: the async traits the session uses to reach the brokerage and
//!   the notifier
//!
//! # Example
//!
//! ```rust,ignore
//! use strategy_core::{DispatchState, InstrumentConfig, TriggerEngine};
//! use rust_decimal_macros::dec;
//!
//! let config = InstrumentConfig { armed: true, ..Default::default() };
//! let mut state = DispatchState::new();
//!
//! let decision = TriggerEngine::evaluate(&config, dec!(67800), dec!(70000), &state);
//! for leg in decision.legs() {
//!     if order_gateway.submit_market_order(&token, &code, leg.quantity, leg.side).await?.is_filled() {
//!         state.mark_fired(leg.side);
//!     }
//! }
//! ```

mod error;
mod instrument;
mod ports;
mod signal;
mod trigger;

pub use error::{ConfigError, OrderError, QuoteError};
pub use instrument::{InstrumentConfig, TriggerRule};
pub use ports::{
    Authenticator, InstrumentDirectory, MarketDataGateway, NotificationSink, OrderGateway,
};
pub use signal::{SignalEvaluator, SignalLabel, SignalReport, MIN_BARS};
pub use trigger::{DispatchDecision, DispatchState, LegOrder, TriggerEngine, TriggerTargets};

pub use model::{InstrumentCode, OrderOutcome, OrderSide, PriceBar, Quote};
