//! The operator's watchlist and its JSON state file.
//!
//! - **Watchlist**: ordered instrument codes, cached display names, one
//!   `InstrumentConfig` per code
//! - **DispatchLedger**: which legs filled today, per instrument, so a
//!   restart on the same trading date does not re-fire them
//! - **WatchlistStore**: whole-document load/save with atomic replace
//!
//! ```json
//! {
//!   "version": 1,
//!   "codes": ["005930"],
//!   "names": {"005930": "삼성전자"},
//!   "configs": {"005930": {"buy": {"pct": "-3.0", "manual_price": "0"},
//!                          "sell": {"pct": "5.0", "manual_price": "0"},
//!                          "quantity": 1, "armed": false}},
//!   "dispatch": {"005930": {"trading_date": "2024-05-02",
//!                           "buy_fired": true, "sell_fired": false}}
//! }
//! ```

mod error;
mod ledger;
mod store;
mod watchlist;

pub use error::{StoreError, WatchlistError};
pub use ledger::DispatchLedger;
pub use store::WatchlistStore;
pub use watchlist::{Watchlist, DEFAULT_CODE, WATCHLIST_VERSION};
