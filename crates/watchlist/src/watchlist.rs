//! The watchlist document.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use model::{InstrumentCode, OrderSide};
use serde::{Deserialize, Serialize};
use strategy_core::{DispatchState, InstrumentConfig};
use tracing::warn;

use crate::error::WatchlistError;
use crate::ledger::DispatchLedger;

/// Current state file version.
pub const WATCHLIST_VERSION: u32 = 1;

/// Instrument watched when nothing has been saved yet.
pub const DEFAULT_CODE: &str = "005930";

/// Watched instruments in operator order, with their names, trigger configs
/// and today's dispatch state.
///
/// Every watched code has exactly one config. Removing a code removes its
/// name, config and dispatch state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    version: u32,
    codes: Vec<InstrumentCode>,
    #[serde(default)]
    names: BTreeMap<InstrumentCode, String>,
    #[serde(default)]
    configs: BTreeMap<InstrumentCode, InstrumentConfig>,
    #[serde(default)]
    dispatch: DispatchLedger,
}

impl Default for Watchlist {
    fn default() -> Self {
        let mut watchlist = Self::empty();
        if let Ok(code) = InstrumentCode::new(DEFAULT_CODE) {
            watchlist.add(code);
        }
        watchlist
    }
}

impl Watchlist {
    pub fn empty() -> Self {
        Self {
            version: WATCHLIST_VERSION,
            codes: Vec::new(),
            names: BTreeMap::new(),
            configs: BTreeMap::new(),
            dispatch: DispatchLedger::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn codes(&self) -> &[InstrumentCode] {
        &self.codes
    }

    pub fn contains(&self, code: &InstrumentCode) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Append `code` with the default config. Returns false if already watched.
    pub fn add(&mut self, code: InstrumentCode) -> bool {
        if self.contains(&code) {
            return false;
        }
        self.configs.insert(code.clone(), InstrumentConfig::default());
        self.dispatch.remove(&code);
        self.codes.push(code);
        true
    }

    /// Remove `code` with everything attached to it. Returns false if not watched.
    pub fn remove(&mut self, code: &InstrumentCode) -> bool {
        let before = self.codes.len();
        self.codes.retain(|c| c != code);
        self.names.remove(code);
        self.configs.remove(code);
        self.dispatch.remove(code);
        self.codes.len() != before
    }

    pub fn config(&self, code: &InstrumentCode) -> Option<&InstrumentConfig> {
        self.configs.get(code)
    }

    /// Replace the config of a watched code after validating it.
    pub fn set_config(
        &mut self,
        code: &InstrumentCode,
        config: InstrumentConfig,
    ) -> Result<(), WatchlistError> {
        if !self.contains(code) {
            return Err(WatchlistError::NotWatched(code.clone()));
        }
        config.validate()?;
        self.configs.insert(code.clone(), config);
        Ok(())
    }

    pub fn name(&self, code: &InstrumentCode) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Cache the display name of a watched code. Ignored for unwatched codes.
    pub fn set_name(&mut self, code: &InstrumentCode, name: impl Into<String>) {
        if self.contains(code) {
            self.names.insert(code.clone(), name.into());
        }
    }

    /// Display name, or the code itself when no name is known.
    pub fn name_or_code<'a>(&'a self, code: &'a InstrumentCode) -> &'a str {
        self.name(code).unwrap_or(code.as_str())
    }

    pub fn dispatch_state(&self, code: &InstrumentCode, date: NaiveDate) -> DispatchState {
        self.dispatch.state(code, date)
    }

    /// Record a confirmed fill. Ignored for unwatched codes.
    pub fn mark_fired(&mut self, code: &InstrumentCode, date: NaiveDate, side: OrderSide) {
        if self.contains(code) {
            self.dispatch.mark_fired(code, date, side);
        }
    }

    /// Restore the one-config-per-code invariant after loading a document
    /// written by hand or by an older build.
    pub(crate) fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.codes.len());
        self.codes.retain(|code| {
            if seen.contains(code) {
                false
            } else {
                seen.push(code.clone());
                true
            }
        });

        for code in &self.codes {
            if !self.configs.contains_key(code) {
                warn!(code = %code, "Watched instrument has no config, using defaults");
                self.configs.insert(code.clone(), InstrumentConfig::default());
            }
        }

        let codes = &self.codes;
        self.configs.retain(|code, _| codes.contains(code));
        self.names.retain(|code, _| codes.contains(code));
        self.dispatch.retain(|code| codes.contains(code));
    }

    pub(crate) fn configs(&self) -> impl Iterator<Item = (&InstrumentCode, &InstrumentConfig)> {
        self.configs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use strategy_core::TriggerRule;

    fn code(raw: &str) -> InstrumentCode {
        InstrumentCode::new(raw).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[test]
    fn test_default_watches_one_instrument() {
        let watchlist = Watchlist::default();
        assert_eq!(watchlist.codes(), &[code("005930")]);
        assert_eq!(
            watchlist.config(&code("005930")),
            Some(&InstrumentConfig::default())
        );
        assert_eq!(watchlist.version(), WATCHLIST_VERSION);
    }

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let mut watchlist = Watchlist::default();
        assert!(watchlist.add(code("000660")));
        assert!(!watchlist.add(code("000660")));
        assert!(watchlist.add(code("035420")));

        assert_eq!(
            watchlist.codes(),
            &[code("005930"), code("000660"), code("035420")]
        );
    }

    #[test]
    fn test_remove_drops_everything_attached() {
        let mut watchlist = Watchlist::default();
        let samsung = code("005930");
        watchlist.set_name(&samsung, "삼성전자");
        watchlist.mark_fired(&samsung, today(), OrderSide::Buy);

        assert!(watchlist.remove(&samsung));
        assert!(!watchlist.remove(&samsung));
        assert!(watchlist.is_empty());
        assert!(watchlist.config(&samsung).is_none());
        assert!(watchlist.name(&samsung).is_none());

        // Re-adding starts clean.
        watchlist.add(samsung.clone());
        assert!(!watchlist.dispatch_state(&samsung, today()).buy_fired());
    }

    #[test]
    fn test_set_config_validates() {
        let mut watchlist = Watchlist::default();
        let samsung = code("005930");

        let inverted = InstrumentConfig {
            buy: TriggerRule::percent(dec!(-3)).manual(dec!(71000)),
            sell: TriggerRule::percent(dec!(5)).manual(dec!(70000)),
            ..Default::default()
        };
        assert!(matches!(
            watchlist.set_config(&samsung, inverted),
            Err(WatchlistError::InvalidConfig(_))
        ));

        let armed = InstrumentConfig {
            armed: true,
            quantity: 10,
            ..Default::default()
        };
        watchlist.set_config(&samsung, armed.clone()).unwrap();
        assert_eq!(watchlist.config(&samsung), Some(&armed));

        assert_eq!(
            watchlist.set_config(&code("000660"), armed),
            Err(WatchlistError::NotWatched(code("000660")))
        );
    }

    #[test]
    fn test_name_or_code() {
        let mut watchlist = Watchlist::default();
        let samsung = code("005930");
        assert_eq!(watchlist.name_or_code(&samsung), "005930");

        watchlist.set_name(&samsung, "삼성전자");
        assert_eq!(watchlist.name_or_code(&samsung), "삼성전자");

        watchlist.set_name(&code("000660"), "SK하이닉스");
        assert!(watchlist.name(&code("000660")).is_none());
    }

    #[test]
    fn test_normalize_repairs_document() {
        let json = r#"{
            "version": 1,
            "codes": ["005930", "000660", "005930"],
            "names": {"035420": "NAVER"},
            "configs": {"035420": {"buy": {"pct": -3}, "sell": {"pct": 5}, "quantity": 1}}
        }"#;
        let mut watchlist: Watchlist = serde_json::from_str(json).unwrap();
        watchlist.normalize();

        assert_eq!(watchlist.codes(), &[code("005930"), code("000660")]);
        assert_eq!(watchlist.configs().count(), 2);
        assert!(watchlist.name(&code("035420")).is_none());
    }
}
