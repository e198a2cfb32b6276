//! Session runtime for the trading assistant.
//!
//! A [`Session`] owns the watchlist document, the in-memory access token and
//! the current trading date. [`SessionRunner`] performs one refresh tick per
//! instrument against the collaborator ports:
//!
//! ```text
//! token ──> quote ──> name ──> signal ──> TriggerEngine ──> orders
//!                                                            │
//!                         persist <── mark_fired <── fill ───┴──> notify
//! ```
//!
//! Only an authentication failure ends the session. A failed quote skips the
//! instrument for this tick; failed orders stay eligible for the next one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strategy_runner::{trading_date, Gateways, Session, SessionRunner};
//!
//! let runner = SessionRunner::new(gateways, token_cache, store.clone());
//! let mut session = Session::new(store.load()?, trading_date(Utc::now()));
//!
//! for result in runner.tick_all(&mut session, trading_date(Utc::now())).await? {
//!     // render the report
//! }
//! ```

mod dry_run;
mod error;
mod runner;
mod session;

pub use dry_run::DryRunOrderGateway;
pub use error::TickError;
pub use runner::{fill_message, Gateways, LegOutcome, LegResult, SessionRunner, TickReport};
pub use session::{trading_date, Session};
