//! Domain types shared by the gateways, the trigger engine and the runner.

mod bar;
mod instrument;
mod order;
mod quote;

pub use bar::{sort_bars, PriceBar};
pub use instrument::{InstrumentCode, InvalidInstrumentCode};
pub use order::{OrderOutcome, OrderSide};
pub use quote::Quote;
