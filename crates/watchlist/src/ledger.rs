//! Per-instrument dispatch state for the current trading date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use model::{InstrumentCode, OrderSide};
use serde::{Deserialize, Serialize};
use strategy_core::DispatchState;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DayEntry {
    trading_date: NaiveDate,
    #[serde(flatten)]
    state: DispatchState,
}

/// Dispatch state keyed by instrument and trading date.
///
/// Only the latest trading date per instrument is kept. Asking for any other
/// date yields a fresh state, so a new day starts with nothing fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchLedger {
    entries: BTreeMap<InstrumentCode, DayEntry>,
}

impl DispatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `code` on `date`.
    pub fn state(&self, code: &InstrumentCode, date: NaiveDate) -> DispatchState {
        self.entries
            .get(code)
            .filter(|entry| entry.trading_date == date)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Record a confirmed fill of `side` for `code` on `date`.
    ///
    /// A fill dated before the stored trading date is ignored.
    pub fn mark_fired(&mut self, code: &InstrumentCode, date: NaiveDate, side: OrderSide) {
        let entry = self
            .entries
            .entry(code.clone())
            .or_insert_with(|| DayEntry {
                trading_date: date,
                state: DispatchState::new(),
            });

        if date < entry.trading_date {
            warn!(
                code = %code,
                date = %date,
                stored = %entry.trading_date,
                "Ignoring fill dated before the stored trading date"
            );
            return;
        }
        if entry.trading_date != date {
            *entry = DayEntry {
                trading_date: date,
                state: DispatchState::new(),
            };
        }
        entry.state.mark_fired(side);
    }

    pub fn remove(&mut self, code: &InstrumentCode) {
        self.entries.remove(code);
    }

    /// Drop entries for codes `keep` rejects.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&InstrumentCode) -> bool) {
        self.entries.retain(|code, _| keep(code));
    }
}
