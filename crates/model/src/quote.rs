//! Current price snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current price of an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price.
    pub last_price: Decimal,
    /// Prior session's close, the base for percent-derived triggers.
    pub reference_price: Decimal,
    /// Change against the reference price, in percent.
    pub change_pct: Decimal,
}
