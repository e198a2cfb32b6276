//! Per-instrument trigger configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One side's trigger: a percent offset from the reference price, optionally
/// overridden by an absolute price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerRule {
    /// Offset from the reference price, in percent (e.g. `-3.0`).
    pub pct: Decimal,
    /// Absolute trigger price. Zero means "not set".
    #[serde(default)]
    pub manual_price: Decimal,
}

impl TriggerRule {
    pub fn percent(pct: Decimal) -> Self {
        Self {
            pct,
            manual_price: Decimal::ZERO,
        }
    }

    pub fn manual(self, price: Decimal) -> Self {
        Self {
            manual_price: price,
            ..self
        }
    }

    pub fn has_manual_price(&self) -> bool {
        self.manual_price > Decimal::ZERO
    }

    /// Trigger price for the given reference price.
    ///
    /// A positive manual price always wins. Otherwise
    /// `reference * (1 + pct / 100)`, truncated to whole currency units.
    pub fn target(&self, reference_price: Decimal) -> Decimal {
        if self.has_manual_price() {
            self.manual_price
        } else {
            (reference_price * (Decimal::ONE + self.pct / Decimal::ONE_HUNDRED)).trunc()
        }
    }
}

/// Trigger configuration for one watched instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    pub buy: TriggerRule,
    pub sell: TriggerRule,
    /// Shares per order.
    pub quantity: u32,
    /// Automatic dispatch enabled.
    #[serde(default)]
    pub armed: bool,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            buy: TriggerRule::percent(Decimal::new(-30, 1)),
            sell: TriggerRule::percent(Decimal::new(50, 1)),
            quantity: 1,
            armed: false,
        }
    }
}

impl InstrumentConfig {
    /// Check the config can be evaluated without surprises.
    ///
    /// Mixed rules (one side manual, the other percent) depend on the live
    /// reference price and are not checked for inversion here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantity == 0 {
            return Err(ConfigError::ZeroQuantity);
        }
        for (side, rule) in [("buy", &self.buy), ("sell", &self.sell)] {
            if rule.manual_price < Decimal::ZERO {
                return Err(ConfigError::NegativeManualPrice {
                    side,
                    price: rule.manual_price,
                });
            }
        }
        if self.buy.pct > Decimal::ZERO || self.buy.pct <= -Decimal::ONE_HUNDRED {
            return Err(ConfigError::BuyPercentOutOfRange(self.buy.pct));
        }
        if self.sell.pct < Decimal::ZERO {
            return Err(ConfigError::SellPercentOutOfRange(self.sell.pct));
        }

        match (self.buy.has_manual_price(), self.sell.has_manual_price()) {
            (true, true) if self.buy.manual_price >= self.sell.manual_price => {
                Err(ConfigError::InvertedTargets {
                    buy: self.buy.manual_price,
                    sell: self.sell.manual_price,
                })
            }
            (false, false) if self.buy.pct >= self.sell.pct => Err(ConfigError::InvertedTargets {
                buy: self.buy.pct,
                sell: self.sell.pct,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid_and_disarmed() {
        let config = InstrumentConfig::default();
        assert_eq!(config.buy.pct, dec!(-3.0));
        assert_eq!(config.sell.pct, dec!(5.0));
        assert_eq!(config.quantity, 1);
        assert!(!config.armed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_percent_target_truncates() {
        let rule = TriggerRule::percent(dec!(-3.0));
        assert_eq!(rule.target(dec!(70000)), dec!(67900));

        // 12345 * 0.97 = 11974.65 -> 11974
        assert_eq!(rule.target(dec!(12345)), dec!(11974));

        // 12345 * 1.05 = 12962.25 -> 12962
        assert_eq!(TriggerRule::percent(dec!(5)).target(dec!(12345)), dec!(12962));
    }

    #[test]
    fn test_manual_price_overrides_percent() {
        let rule = TriggerRule::percent(dec!(-50)).manual(dec!(68000));
        assert_eq!(rule.target(dec!(70000)), dec!(68000));
        assert_eq!(rule.target(dec!(1)), dec!(68000));
    }

    #[test]
    fn test_zero_manual_price_means_unset() {
        let rule = TriggerRule::percent(dec!(-3)).manual(dec!(0));
        assert!(!rule.has_manual_price());
        assert_eq!(rule.target(dec!(70000)), dec!(67900));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let config = InstrumentConfig {
            quantity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroQuantity));
    }

    #[test]
    fn test_validate_rejects_inverted_manual_prices() {
        let config = InstrumentConfig {
            buy: TriggerRule::percent(dec!(-3)).manual(dec!(71000)),
            sell: TriggerRule::percent(dec!(5)).manual(dec!(70000)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedTargets { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_flat_percent_band() {
        let config = InstrumentConfig {
            buy: TriggerRule::percent(dec!(0)),
            sell: TriggerRule::percent(dec!(0)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedTargets { .. })
        ));
    }

    #[test]
    fn test_validate_percent_ranges() {
        let positive_buy = InstrumentConfig {
            buy: TriggerRule::percent(dec!(1)),
            ..Default::default()
        };
        assert!(matches!(
            positive_buy.validate(),
            Err(ConfigError::BuyPercentOutOfRange(_))
        ));

        let negative_sell = InstrumentConfig {
            sell: TriggerRule::percent(dec!(-1)),
            ..Default::default()
        };
        assert!(matches!(
            negative_sell.validate(),
            Err(ConfigError::SellPercentOutOfRange(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_manual() {
        let config = InstrumentConfig {
            sell: TriggerRule::percent(dec!(5)).manual(dec!(-1)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeManualPrice { side: "sell", .. })
        ));
    }

    #[test]
    fn test_serde_shape() {
        let json = r#"{
            "buy": {"pct": "-2.5", "manual_price": "0"},
            "sell": {"pct": 4},
            "quantity": 3,
            "armed": true
        }"#;
        let config: InstrumentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.buy.pct, dec!(-2.5));
        assert_eq!(config.sell.manual_price, dec!(0));
        assert_eq!(config.quantity, 3);
        assert!(config.armed);

        let unknown = r#"{"buy": {"pct": 0}, "sell": {"pct": 1}, "quantity": 1, "auto": true}"#;
        assert!(serde_json::from_str::<InstrumentConfig>(unknown).is_err());
    }
}
